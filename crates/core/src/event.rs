// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event vocabulary carried over the bus (Component C, external).
//!
//! Topic shapes are grounded on `tool_lib/events.py` for the tool-IO wire
//! schema and on SPEC_FULL.md §6 for the `ratio::*` system topics.

use crate::ids::ProcessId;
use crate::tool_definition::ArgumentSpec;
use serde::{Deserialize, Serialize};

/// Request published on a leaf tool's `system_event_endpoint`.
///
/// `argument_schema` is required exactly when `arguments_path` is present
/// (SPEC_FULL.md §6 tool-IO wire schema supplement).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemExecuteToolRequest {
    pub arguments_path: Option<String>,
    pub argument_schema: Option<Vec<ArgumentSpec>>,
    pub parent_process_id: String,
    pub process_id: ProcessId,
    pub response_schema: Option<Vec<ArgumentSpec>>,
    pub token: String,
    pub working_directory: String,
}

impl SystemExecuteToolRequest {
    /// Enforces the invariant from `tool_lib/events.py`: an arguments path
    /// without its schema (or vice versa) is malformed.
    pub fn is_well_formed(&self) -> bool {
        self.arguments_path.is_some() == self.argument_schema.is_some()
    }
}

/// Response consumed from a leaf handler on `ratio::tool_response`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemExecuteToolResponse {
    pub failure: Option<String>,
    pub parent_process_id: String,
    pub process_id: ProcessId,
    /// Path to the response file in storage, when successful.
    pub response: Option<String>,
    pub status: String,
    pub token: String,
}

/// Internal event vocabulary the daemon's single event loop dispatches.
///
/// Mirrors the teacher's `Event` enum shape (one flat enum covering every
/// topic the loop can receive, tagged for the WAL/log) but carries the
/// process-engine's topics instead of job/agent lifecycle topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// `ratio::tool_response`
    ToolResponse(SystemExecuteToolResponse),
    /// `ratio::execute_composite_tool`
    ExecuteCompositeTool { process_id: ProcessId },
    /// `ratio::parallel_completion_reconciliation`
    ParallelCompletionReconciliation { parent_process_id: String },
    /// `ratio::file_event`
    FileEvent {
        file_path: String,
        file_event_type: String,
        file_type: Option<String>,
        actor: String,
    },
    /// `ratio::system_event`
    SystemEvent {
        event_type: String,
        payload: serde_json::Value,
    },
    /// Reconciler-driven timeout sweep tick.
    ReconcileTick,
}

impl Event {
    pub fn log_summary(&self) -> String {
        match self {
            Event::ToolResponse(r) => format!("tool_response process_id={}", r.process_id),
            Event::ExecuteCompositeTool { process_id } => {
                format!("execute_composite_tool process_id={process_id}")
            }
            Event::ParallelCompletionReconciliation { parent_process_id } => {
                format!("parallel_completion_reconciliation parent={parent_process_id}")
            }
            Event::FileEvent { file_path, file_event_type, .. } => {
                format!("file_event path={file_path} type={file_event_type}")
            }
            Event::SystemEvent { event_type, .. } => format!("system_event type={event_type}"),
            Event::ReconcileTick => "reconcile_tick".to_string(),
        }
    }
}
