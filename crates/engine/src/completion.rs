// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Completion Handler (Component J): consumes a leaf's
//! `ratio::tool_response` event, CAS-transitions the corresponding
//! process, and re-enters the Composite Executor for its parent so the
//! parent's next wave can run (SPEC_FULL.md §4.7).

use crate::error::EngineError;
use crate::executor::{AdvanceOutcome, CompositeExecutor};
use chrono::{DateTime, Utc};
use ratio_core::ids::SYSTEM_PARENT;
use ratio_core::{ProcessId, ProcessStatus, SystemExecuteToolResponse};
use ratio_store::{ProcessStore, StoreError};
use std::sync::Arc;

pub struct CompletionHandler {
    process_store: Arc<ProcessStore>,
    executor: Arc<CompositeExecutor>,
}

impl CompletionHandler {
    pub fn new(process_store: Arc<ProcessStore>, executor: Arc<CompositeExecutor>) -> Self {
        Self { process_store, executor }
    }

    /// Handle one `ratio::tool_response` payload from a leaf handler.
    /// Returns the outcome of re-entering the parent's executor, or
    /// `None` when the response is for a root process (no parent to
    /// advance) or the transition lost a race with a concurrent caller.
    pub async fn handle(
        &self,
        response: SystemExecuteToolResponse,
        now: DateTime<Utc>,
    ) -> Result<Option<AdvanceOutcome>, EngineError> {
        let status = if response.failure.is_some() { ProcessStatus::Failed } else { ProcessStatus::Completed };

        match self.process_store.compare_and_transition(
            &response.process_id,
            status,
            now,
            response.failure.clone(),
            response.response.clone(),
        ) {
            Ok(_) => {}
            Err(StoreError::NotRunning { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        if response.parent_process_id == SYSTEM_PARENT {
            return Ok(None);
        }

        let parent_id = ProcessId::from_string(&response.parent_process_id);
        let token = (!response.token.is_empty()).then_some(response.token.as_str());
        let outcome = self.executor.advance(parent_id, token, now).await?;
        Ok(Some(outcome))
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
