// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared root-process launch logic: the part of the Process Manager
//! API's `execute` (Component H, SPEC_FULL.md §4.5) that doesn't care
//! whether the caller is the HTTP gateway or the Scheduler (L)
//! constructing a triggered execution (SPEC_FULL.md §4.8) — validate the
//! definition, allocate a `process_id`, persist the arguments object, and
//! either publish the leaf event or hand off to the Composite Executor.
//!
//! Auth/ownership decisions (admin-only `execute_as`, 403/404 mapping)
//! stay with the caller; by the time `ProcessLauncher::execute` runs, the
//! owner and working directory are already resolved.

use crate::error::EngineError;
use crate::tool_source::ToolSource;
use crate::{paths, ToolIo};
use chrono::{DateTime, Utc};
use ratio_adapters::{put_json, EventBus, Storage};
use ratio_core::ids::SYSTEM_PARENT;
use ratio_core::tool_definition::InstructionTool;
use ratio_core::{Process, ProcessId, SystemExecuteToolRequest, ToolDefinition};
use ratio_store::ProcessStore;
use ratio_validator::{validate, ToolDefinitionLookup};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A caller's tool definition: either sent inline, or a path to resolve
/// through Storage (D) — the "exactly one of `tool_definition` or
/// `tool_definition_path`" shape `/process/execute` accepts (spec.md §6).
pub enum ToolDefinitionRef {
    Inline(ToolDefinition),
    Path(String),
}

/// A [`ToolDefinitionLookup`] backed by definitions fetched up front, so
/// the (sync) validator can check reference types against
/// `tool_definition_path` instructions without itself needing to be
/// async.
pub struct PrefetchedLookup {
    defs: HashMap<String, ToolDefinition>,
}

impl ToolDefinitionLookup for PrefetchedLookup {
    fn resolve(&self, path: &str) -> Option<ToolDefinition> {
        self.defs.get(path).cloned()
    }
}

fn collect_referenced_paths(def: &ToolDefinition, out: &mut Vec<String>) {
    let Some(instructions) = &def.instructions else { return };
    for instruction in instructions {
        match &instruction.tool {
            InstructionTool::Path { tool_definition_path } => out.push(tool_definition_path.clone()),
            InstructionTool::Inline { tool_definition } => collect_referenced_paths(tool_definition, out),
        }
    }
}

/// Fetch every `tool_definition_path` a composite's instruction graph
/// references, transitively, so the (sync) validator can check reference
/// types against them. Exposed for callers outside [`ProcessLauncher`]
/// (the gateway's standalone `/process/validate` path) that need the same
/// lookup without going through a full `execute`.
pub async fn prefetch_lookup(tool_source: &dyn ToolSource, def: &ToolDefinition) -> Result<PrefetchedLookup, EngineError> {
    let mut queue = Vec::new();
    collect_referenced_paths(def, &mut queue);
    let mut seen = HashSet::new();
    let mut defs = HashMap::new();
    while let Some(path) = queue.pop() {
        if !seen.insert(path.clone()) {
            continue;
        }
        let resolved = tool_source.load_path(&path).await?;
        collect_referenced_paths(&resolved, &mut queue);
        defs.insert(path, resolved);
    }
    Ok(PrefetchedLookup { defs })
}

pub struct ProcessLauncher {
    process_store: Arc<ProcessStore>,
    storage: Arc<dyn Storage>,
    event_bus: Arc<dyn EventBus>,
    tool_source: Arc<dyn ToolSource>,
}

impl ProcessLauncher {
    pub fn new(
        process_store: Arc<ProcessStore>,
        storage: Arc<dyn Storage>,
        event_bus: Arc<dyn EventBus>,
        tool_source: Arc<dyn ToolSource>,
    ) -> Self {
        Self { process_store, storage, event_bus, tool_source }
    }

    async fn prefetch_lookup(&self, def: &ToolDefinition) -> Result<PrefetchedLookup, EngineError> {
        prefetch_lookup(self.tool_source.as_ref(), def).await
    }

    /// Validate and launch a new root process (SPEC_FULL.md §4.5 steps 1-4).
    /// `token` carries the caller's bearer token onward for leaf
    /// dispatch and any `REF:…` file fetch the first wave needs.
    #[allow(clippy::too_many_arguments)]
    pub async fn execute(
        &self,
        definition_ref: ToolDefinitionRef,
        arguments: ToolIo,
        owner: impl Into<String>,
        working_directory: impl Into<String>,
        websocket_connection_id: Option<String>,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ProcessId, EngineError> {
        let owner = owner.into();
        let working_directory = working_directory.into();

        let (def, existing_def_path) = match definition_ref {
            ToolDefinitionRef::Inline(def) => (def, None),
            ToolDefinitionRef::Path(path) => {
                let def = self.tool_source.load_path(&path).await?;
                (def, Some(path))
            }
        };

        let lookup = self.prefetch_lookup(&def).await?;
        validate(&def, &lookup)?;

        let process_id = ProcessId::new();
        let args_path = paths::arguments_path(&working_directory, &process_id);
        put_json(self.storage.as_ref(), &args_path, &arguments).await?;

        let mut process = Process::new_root(process_id, owner, working_directory.clone(), now);
        process.arguments_path = Some(args_path.clone());
        process.websocket_connection_id = websocket_connection_id;

        if def.is_composite() {
            let def_path = match existing_def_path {
                Some(path) => path,
                None => {
                    let path = paths::definition_path(&working_directory, &process_id);
                    put_json(self.storage.as_ref(), &path, &def).await?;
                    path
                }
            };
            process.tool_definition_path = Some(def_path);
            self.process_store.insert(process);
            self.event_bus
                .publish("ratio::execute_composite_tool", serde_json::json!({"process_id": process_id}))
                .await?;
        } else {
            self.process_store.insert(process);
            let endpoint =
                def.system_event_endpoint.clone().ok_or(EngineError::MalformedTool("leaf tool missing system_event_endpoint"))?;
            let request = SystemExecuteToolRequest {
                arguments_path: Some(args_path),
                argument_schema: Some(def.arguments.clone()),
                parent_process_id: SYSTEM_PARENT.to_string(),
                process_id,
                response_schema: Some(def.responses.clone()),
                token: token.unwrap_or_default().to_string(),
                working_directory,
            };
            self.event_bus.publish(&endpoint, serde_json::to_value(request)?).await?;
        }

        Ok(process_id)
    }
}
