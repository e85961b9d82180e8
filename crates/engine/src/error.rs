// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ratio_core::ProcessId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no process with id {0}")]
    ProcessNotFound(ProcessId),

    #[error("process {0} has no tool_definition_path to re-enter from")]
    MissingDefinition(ProcessId),

    #[error("process {0} has no arguments_path")]
    MissingArguments(ProcessId),

    #[error("malformed tool definition: {0}")]
    MalformedTool(&'static str),

    #[error("reference resolution failed: {0}")]
    Resolve(#[from] ratio_resolver::ResolveError),

    #[error(transparent)]
    Validation(#[from] ratio_validator::ValidationError),

    #[error(transparent)]
    Store(#[from] ratio_store::StoreError),

    #[error(transparent)]
    Adapter(#[from] ratio_adapters::AdapterError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
