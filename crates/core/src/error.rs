// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error kinds for the process engine.

use thiserror::Error;

/// Errors that can arise while manipulating core data-model types
/// (independent of any particular storage or transport crate).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed reference {0:?}: {1}")]
    InvalidReference(String, &'static str),

    #[error("attribute {attribute:?} is not valid for a {kind} value")]
    InvalidAttribute { kind: &'static str, attribute: String },

    #[error("value {0:?} cannot be read as a number")]
    NotANumber(String),

    #[error("validation failed at {path}: {message}")]
    Validation { path: String, message: String },
}
