// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upward notification helper: turn a just-finalized [`Process`] into a
//! `ratio::tool_response` event for its parent (or for whoever is waiting
//! on a root process, e.g. the gateway's websocket bridge).

use crate::error::EngineError;
use ratio_adapters::EventBus;
use ratio_core::{Process, SystemExecuteToolResponse};
use std::sync::Arc;

/// Publish `process`'s terminal outcome on `ratio::tool_response`. Carries
/// `token` along so whoever re-enters the parent's composite executor can
/// keep resolving `REF:…` file targets without re-authenticating.
pub async fn tool_response(
    bus: &Arc<dyn EventBus>,
    process: &Process,
    token: Option<&str>,
) -> Result<(), EngineError> {
    let failure = match process.execution_status {
        ratio_core::ProcessStatus::Completed | ratio_core::ProcessStatus::Skipped => None,
        _ => Some(process.status_message.clone().unwrap_or_else(|| process.execution_status.to_string())),
    };
    let response = SystemExecuteToolResponse {
        failure,
        parent_process_id: process.parent_process_id.clone(),
        process_id: process.process_id,
        response: process.response_path.clone(),
        status: process.execution_status.to_string(),
        token: token.unwrap_or_default().to_string(),
    };
    bus.publish("ratio::tool_response", serde_json::to_value(response)?).await?;
    Ok(())
}
