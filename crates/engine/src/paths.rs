// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage path conventions for the per-process artifacts the engine
//! writes: arguments, responses, and (for composites) the resolved tool
//! definition a process should be re-entered from. Keeping everything
//! under the process's own directory means a crashed daemon's restart
//! needs nothing beyond the persisted [`ratio_core::Process`] record to
//! resume driving it forward.

use ratio_core::ProcessId;

fn process_dir(working_directory: &str, process_id: &ProcessId) -> String {
    format!("{}/.ratio/processes/{}", working_directory.trim_end_matches('/'), process_id)
}

pub fn arguments_path(working_directory: &str, process_id: &ProcessId) -> String {
    format!("{}/arguments.json", process_dir(working_directory, process_id))
}

pub fn response_path(working_directory: &str, process_id: &ProcessId) -> String {
    format!("{}/response.json", process_dir(working_directory, process_id))
}

pub fn definition_path(working_directory: &str, process_id: &ProcessId) -> String {
    format!("{}/definition.json", process_dir(working_directory, process_id))
}
