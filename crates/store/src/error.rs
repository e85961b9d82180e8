// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ratio_core::ProcessStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("no process with id {0:?}")]
    ProcessNotFound(String),

    #[error("no subscription with id {0:?}")]
    SubscriptionNotFound(String),

    #[error("process {process_id:?} is not RUNNING (currently {current}), cannot transition to {attempted}")]
    NotRunning { process_id: String, current: ProcessStatus, attempted: ProcessStatus },

    #[error("IO error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serde(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e.to_string())
    }
}
