// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Reconciler (Component K): periodic liveness repair over two
//! failure modes the event-driven path alone cannot self-heal
//! (SPEC_FULL.md §4.9):
//!
//! - a `RUNNING` process whose `started_on` is older than the configured
//!   `global_process_timeout_minutes` with no completion event ever
//!   arriving (a crashed/unreachable leaf handler), timed out and treated
//!   as a completion so its parent can proceed. This is distinct from
//!   `time_to_live`, which is a garbage-collection expiry (spec.md §3),
//!   not a liveness timeout.
//! - a `RUNNING` composite whose children are all terminal but whose
//!   executor was never re-entered (a dropped `ratio::tool_response`
//!   event, or a daemon restart mid-wave) — the "stuck parent" problem.

use crate::error::EngineError;
use crate::executor::{AdvanceOutcome, CompositeExecutor};
use chrono::{DateTime, Utc};
use ratio_core::{GlobalSettings, Process, ProcessStatus};
use ratio_store::{ProcessStore, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Reconciler {
    process_store: Arc<ProcessStore>,
    executor: Arc<CompositeExecutor>,
}

/// Summary of one reconciliation pass, for logging/metrics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcileReport {
    pub timed_out: usize,
    pub stuck_parents_advanced: usize,
}

impl Reconciler {
    pub fn new(process_store: Arc<ProcessStore>, executor: Arc<CompositeExecutor>) -> Self {
        Self { process_store, executor }
    }

    pub async fn reconcile(&self, now: DateTime<Utc>, settings: &GlobalSettings) -> Result<ReconcileReport, EngineError> {
        let mut report = ReconcileReport::default();

        for process in self.process_store.running_older_than(now, settings.global_process_timeout_minutes) {
            // Only leaves are timed out directly (SPEC_FULL.md §4.9): an
            // overdue composite is repaired by re-entering the executor,
            // which the stuck-parent sweep below already does
            // unconditionally once all its children are terminal.
            if process.tool_definition_path.is_some() {
                continue;
            }
            if self.time_out(&process, now).await? {
                report.timed_out += 1;
            }
        }

        for parent in self.process_store.running_parents_with_all_children_terminal() {
            let token: Option<&str> = None;
            match self.executor.advance(parent.process_id, token, now).await {
                Ok(AdvanceOutcome::AlreadyTerminal) => {}
                Ok(_) => report.stuck_parents_advanced += 1,
                Err(err) => warn!(process_id = %parent.process_id, ?err, "reconciler: stuck-parent advance failed"),
            }
        }

        Ok(report)
    }

    async fn time_out(&self, process: &Process, now: DateTime<Utc>) -> Result<bool, EngineError> {
        let message = Some("process exceeded the configured timeout with no completion".to_string());
        match self.process_store.compare_and_transition(&process.process_id, ProcessStatus::TimedOut, now, message, None) {
            Ok(updated) => {
                info!(process_id = %updated.process_id, "reconciler: timed out process");
                if updated.parent_process_id != ratio_core::ids::SYSTEM_PARENT {
                    let parent_id = ratio_core::ProcessId::from_string(&updated.parent_process_id);
                    self.executor.advance(parent_id, None, now).await?;
                }
                Ok(true)
            }
            Err(StoreError::NotRunning { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
