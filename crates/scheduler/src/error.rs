// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("malformed event payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Engine(#[from] ratio_engine::EngineError),

    #[error(transparent)]
    Store(#[from] ratio_store::StoreError),
}
