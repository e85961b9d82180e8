// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP-status mapping for every error kind the Process Manager API
//! can surface (SPEC_FULL.md §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ratio_adapters::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ratio_validator::ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Engine(#[from] ratio_engine::EngineError),

    #[error(transparent)]
    Store(#[from] ratio_store::StoreError),

    #[error(transparent)]
    Adapter(#[from] ratio_adapters::AdapterError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::NotOwnerOrAdmin) => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Store(ratio_store::StoreError::ProcessNotFound(_) | ratio_store::StoreError::SubscriptionNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Adapter(ratio_adapters::AdapterError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Engine(ratio_engine::EngineError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Engine(ratio_engine::EngineError::ProcessNotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({"error": self.to_string()}));
        (status, body).into_response()
    }
}
