// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! ratio-gateway: the Process Manager API (Component H) — HTTP routes
//! plus the websocket streaming bridge, grounded on the agenticlaw
//! gateway's axum shape.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the gateway's router over `state`. The caller owns binding and
/// serving (daemon wiring, SPEC_FULL.md §5).
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/process/execute", post(routes::process::execute))
        .route("/process/describe_process", post(routes::process::describe_process))
        .route("/process/list_processes", post(routes::process::list_processes))
        .route("/process/validate", post(routes::process::validate_definition))
        .route("/scheduler/create_subscription", post(routes::scheduler::create_subscription))
        .route("/scheduler/delete_subscription", post(routes::scheduler::delete_subscription))
        .route("/scheduler/describe_subscription", post(routes::scheduler::describe_subscription))
        .route("/scheduler/list_subscription", post(routes::scheduler::list_subscriptions))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}
