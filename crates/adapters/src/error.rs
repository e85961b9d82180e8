// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors surfaced by the external-collaborator adapters (C/D/E).
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("no subscriber for topic {0:?}")]
    NoSubscriber(String),

    #[error("storage path not found: {0:?}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("auth error: {0}")]
    Auth(#[from] crate::auth::AuthError),
}

impl From<std::io::Error> for AdapterError {
    fn from(e: std::io::Error) -> Self {
        AdapterError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(e: serde_json::Error) -> Self {
        AdapterError::Serde(e.to_string())
    }
}
