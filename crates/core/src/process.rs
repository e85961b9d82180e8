// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Process record: one execution of one tool.
//!
//! Shape grounded on `processes/client.py` in the source: partition key
//! `parent_process_id` (literal `"SYSTEM"` for roots), sort key
//! `process_id`, a default two-hour TTL, and a required `process_owner` /
//! `working_directory`.

use crate::ids::{ExecutionId, ProcessId, SYSTEM_PARENT};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`Process`]. `RUNNING` is the only non-terminal
/// value; everything else is sticky (invariant 1 in SPEC_FULL.md §8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    Running,
    Completed,
    Failed,
    Skipped,
    Terminated,
    TimedOut,
}

impl ProcessStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProcessStatus::Running)
    }
}

crate::simple_display! {
    ProcessStatus {
        Running => "RUNNING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Skipped => "SKIPPED",
        Terminated => "TERMINATED",
        TimedOut => "TIMED_OUT",
    }
}

/// One execution of one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub process_id: ProcessId,
    /// Literal `"SYSTEM"` for root processes.
    pub parent_process_id: String,
    /// Name of this instruction within the parent's instruction list; keys
    /// the parent's response map. Empty for root processes.
    pub execution_id: Option<ExecutionId>,
    pub process_owner: String,
    pub working_directory: String,
    pub execution_status: ProcessStatus,
    pub started_on: chrono::DateTime<chrono::Utc>,
    pub ended_on: Option<chrono::DateTime<chrono::Utc>>,
    pub status_message: Option<String>,
    pub time_to_live: chrono::DateTime<chrono::Utc>,
    pub arguments_path: Option<String>,
    pub response_path: Option<String>,
    pub websocket_connection_id: Option<String>,
    /// Storage path to this process's resolved `ToolDefinition`, written
    /// once at creation. The composite executor re-enters a process purely
    /// from this persisted state (SPEC_FULL.md §9 "Cyclic control": never
    /// from an in-memory continuation), so the instruction graph it needs
    /// to drive forward has to be loadable from here even after a restart.
    /// `None` for leaf processes, which need no further instruction graph.
    #[serde(default)]
    pub tool_definition_path: Option<String>,
}

impl Process {
    /// Default time-to-live window: two hours, matching the source's
    /// `time_to_live` attribute default of `now + 2h`.
    pub const DEFAULT_TTL_SECS: i64 = 7200;

    pub fn new_root(
        process_id: ProcessId,
        process_owner: impl Into<String>,
        working_directory: impl Into<String>,
        started_on: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            process_id,
            parent_process_id: SYSTEM_PARENT.to_string(),
            execution_id: None,
            process_owner: process_owner.into(),
            working_directory: working_directory.into(),
            execution_status: ProcessStatus::Running,
            started_on,
            ended_on: None,
            status_message: None,
            time_to_live: started_on + chrono::Duration::seconds(Self::DEFAULT_TTL_SECS),
            arguments_path: None,
            response_path: None,
            websocket_connection_id: None,
            tool_definition_path: None,
        }
    }

    pub fn new_child(
        process_id: ProcessId,
        parent_process_id: impl Into<String>,
        execution_id: ExecutionId,
        process_owner: impl Into<String>,
        working_directory: impl Into<String>,
        websocket_connection_id: Option<String>,
        started_on: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            process_id,
            parent_process_id: parent_process_id.into(),
            execution_id: Some(execution_id),
            process_owner: process_owner.into(),
            working_directory: working_directory.into(),
            execution_status: ProcessStatus::Running,
            started_on,
            ended_on: None,
            status_message: None,
            time_to_live: started_on + chrono::Duration::seconds(Self::DEFAULT_TTL_SECS),
            arguments_path: None,
            response_path: None,
            websocket_connection_id,
            tool_definition_path: None,
        }
    }

    /// Stamp the storage path of this process's resolved tool definition.
    pub fn with_tool_definition_path(mut self, path: impl Into<String>) -> Self {
        self.tool_definition_path = Some(path.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_process_id == SYSTEM_PARENT
    }

    /// Mark the process terminal in-place. Callers that need CAS semantics
    /// against a shared store should use `ratio_store`'s
    /// `compare_and_transition` rather than mutating a local copy directly.
    pub fn finish(
        &mut self,
        status: ProcessStatus,
        ended_on: chrono::DateTime<chrono::Utc>,
        status_message: Option<String>,
        response_path: Option<String>,
    ) {
        debug_assert!(status.is_terminal());
        self.execution_status = status;
        self.ended_on = Some(ended_on);
        self.status_message = status_message;
        self.response_path = response_path;
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
