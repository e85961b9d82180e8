// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory Process Store (Component A): owns every [`Process`] record and
//! provides the CAS transition the engine and reconciler rely on to avoid
//! double-finalizing a process (SPEC_FULL.md §8, invariant 1).

use crate::StoreError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use ratio_core::{Process, ProcessId, ProcessStatus};
use std::collections::HashMap;

/// Owns the process table plus a secondary `parent_process_id -> children`
/// index, kept in sync on every insert.
#[derive(Default)]
pub struct ProcessStore {
    processes: RwLock<HashMap<ProcessId, Process>>,
    children_index: RwLock<HashMap<String, Vec<ProcessId>>>,
}

impl ProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, process: Process) {
        let process_id = process.process_id;
        let parent = process.parent_process_id.clone();
        self.processes.write().insert(process_id, process);
        self.children_index.write().entry(parent).or_default().push(process_id);
    }

    pub fn get(&self, process_id: &ProcessId) -> Option<Process> {
        self.processes.read().get(process_id).cloned()
    }

    pub fn children_of(&self, parent_process_id: &str) -> Vec<Process> {
        let processes = self.processes.read();
        self.children_index
            .read()
            .get(parent_process_id)
            .into_iter()
            .flatten()
            .filter_map(|id| processes.get(id).cloned())
            .collect()
    }

    /// Atomically transition `process_id` from `RUNNING` to a terminal
    /// status. Fails if the process is missing or already terminal — the
    /// read-modify-write happens under a single write-lock acquisition so
    /// two callers racing to finalize the same process never both succeed.
    #[allow(clippy::too_many_arguments)]
    pub fn compare_and_transition(
        &self,
        process_id: &ProcessId,
        new_status: ProcessStatus,
        ended_on: DateTime<Utc>,
        status_message: Option<String>,
        response_path: Option<String>,
    ) -> Result<Process, StoreError> {
        debug_assert!(new_status.is_terminal());
        let mut processes = self.processes.write();
        let process = processes
            .get_mut(process_id)
            .ok_or_else(|| StoreError::ProcessNotFound(process_id.to_string()))?;

        if process.execution_status != ProcessStatus::Running {
            return Err(StoreError::NotRunning {
                process_id: process_id.to_string(),
                current: process.execution_status,
                attempted: new_status,
            });
        }

        process.finish(new_status, ended_on, status_message, response_path);
        Ok(process.clone())
    }

    /// RUNNING processes whose `started_on` is older than `minutes` —
    /// input to the reconciler's timeout sweep (SPEC_FULL.md §4.1/§4.9).
    /// This is the configured `global_process_timeout_minutes` cutoff, not
    /// the `time_to_live` garbage-collection expiry (spec.md §3: the two
    /// are distinct), grounded on the original's
    /// `get_running_processes_older_than(minutes)` computing
    /// `cutoff = now - timedelta(minutes)` against `started_on`.
    pub fn running_older_than(&self, now: DateTime<Utc>, minutes: u32) -> Vec<Process> {
        let cutoff = now - chrono::Duration::minutes(minutes as i64);
        self.processes
            .read()
            .values()
            .filter(|p| p.execution_status == ProcessStatus::Running && p.started_on <= cutoff)
            .cloned()
            .collect()
    }

    /// RUNNING processes that have at least one child and whose children
    /// are all terminal — candidates for a missed wave-advancement or
    /// finalization the reconciler should re-drive (SPEC_FULL.md §4.9).
    pub fn running_parents_with_all_children_terminal(&self) -> Vec<Process> {
        let processes = self.processes.read();
        let children_index = self.children_index.read();
        processes
            .values()
            .filter(|p| p.execution_status == ProcessStatus::Running)
            .filter(|p| {
                let children = match children_index.get(p.process_id.as_str()) {
                    Some(c) if !c.is_empty() => c,
                    _ => return false,
                };
                children.iter().all(|child_id| {
                    processes.get(child_id).is_some_and(|c| c.execution_status.is_terminal())
                })
            })
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Process> {
        self.processes.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.processes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "process_store_tests.rs"]
mod tests;
