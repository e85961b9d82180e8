// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Composite Executor (Component I): drives a composite tool's
//! instruction graph forward in waves (SPEC_FULL.md §4.6).
//!
//! `advance` is the single entry point, re-entered by the Completion
//! Handler (J) after every child completion and by the Reconciler (K) on
//! its timeout/stuck-parent sweeps. It is idempotent by construction: it
//! re-derives everything from the persisted [`Process`]/child records and
//! never consults in-memory state left over from a previous call
//! (SPEC_FULL.md §9 "Cyclic control").

use crate::convert::{json_literal_to_typed, resolved_to_json, resolved_to_typed};
use crate::error::EngineError;
use crate::tool_source::ToolSource;
use crate::ToolIo;
use crate::{paths, publish};
use chrono::{DateTime, Utc};
use ratio_adapters::{get_json, put_json, EventBus, Storage};
use ratio_core::{ExecutionId, Process, ProcessId, ProcessStatus, SystemExecuteToolRequest};
use ratio_resolver::{FileContentFetcher, RefContext, Reference, Resolver};
use ratio_store::{ProcessStore, StoreError};
use std::collections::HashSet;
use std::sync::Arc;

/// What happened as a result of one `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// The process was already terminal; nothing to do.
    AlreadyTerminal,
    /// One or more instructions were launched this wave.
    Launched(Vec<ExecutionId>),
    /// No instruction is runnable yet and at least one child is still
    /// `RUNNING` — waiting on completion events.
    Blocked,
    /// The composite resolved to a terminal status this call.
    Finalized(ProcessStatus),
}

pub struct CompositeExecutor {
    process_store: Arc<ProcessStore>,
    storage: Arc<dyn Storage>,
    event_bus: Arc<dyn EventBus>,
    tool_source: Arc<dyn ToolSource>,
    file_fetcher: Arc<dyn FileContentFetcher>,
}

impl CompositeExecutor {
    pub fn new(
        process_store: Arc<ProcessStore>,
        storage: Arc<dyn Storage>,
        event_bus: Arc<dyn EventBus>,
        tool_source: Arc<dyn ToolSource>,
        file_fetcher: Arc<dyn FileContentFetcher>,
    ) -> Self {
        Self { process_store, storage, event_bus, tool_source, file_fetcher }
    }

    /// Re-enter the executor for `process_id`. `token` is the bearer
    /// token of the process's owner, threaded through so file-valued
    /// references can be fetched and upward `tool_response` events carry
    /// it on to the next level.
    pub async fn advance(
        &self,
        process_id: ProcessId,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AdvanceOutcome, EngineError> {
        let parent = self.process_store.get(&process_id).ok_or(EngineError::ProcessNotFound(process_id))?;
        if parent.execution_status.is_terminal() {
            return Ok(AdvanceOutcome::AlreadyTerminal);
        }

        let children = self.process_store.children_of(process_id.as_str());

        // Short-circuit failure (SPEC_FULL.md §4.7): any failed child
        // finalizes the parent immediately, regardless of siblings still
        // running — their eventual responses are discarded for this parent.
        // A timed-out child behaves as a completion that failed
        // (SPEC_FULL.md §4.9): it carries no response, so letting the
        // parent finalize normally would resolve `response_reference_map`
        // against a missing sibling response instead of failing.
        if let Some(failed_child) =
            children.iter().find(|c| matches!(c.execution_status, ProcessStatus::Failed | ProcessStatus::TimedOut))
        {
            return self.finalize_failed(&parent, failed_child, now, token).await;
        }

        let def_path = parent.tool_definition_path.clone().ok_or(EngineError::MissingDefinition(process_id))?;
        let def = self.tool_source.load_path(&def_path).await?;
        let instructions = def.instructions.clone().ok_or(EngineError::MalformedTool("composite has no instructions"))?;

        let children_by_exec: HashSet<&str> =
            children.iter().filter_map(|c| c.execution_id.as_ref().map(|e| e.as_str())).collect();
        let terminal_exec_ids: HashSet<ExecutionId> = children
            .iter()
            .filter(|c| c.execution_status.is_terminal())
            .filter_map(|c| c.execution_id.clone())
            .collect();

        let args_path = parent.arguments_path.clone().ok_or(EngineError::MissingArguments(process_id))?;
        let arguments: ToolIo = get_json(self.storage.as_ref(), &args_path).await?;
        let mut resolver = Resolver::new(arguments);
        for child in &children {
            let (Some(exec_id), true) = (&child.execution_id, child.execution_status.is_terminal()) else { continue };
            if let Some(resp_path) = &child.response_path {
                let response: ToolIo = get_json(self.storage.as_ref(), resp_path).await?;
                for (name, value) in response {
                    resolver.add_response(exec_id.clone(), name, value);
                }
            }
        }

        let mut launched = Vec::new();
        for instruction in &instructions {
            if children_by_exec.contains(instruction.execution_id.as_str()) {
                continue;
            }

            if let Some(conditions) = &instruction.conditions {
                let lookup = |field: &str| resolver.resolve_sync(field).ok().map(resolved_to_json);
                if !ratio_core::evaluate_condition(conditions, &lookup) {
                    self.materialize_skipped(&parent, &instruction.execution_id, now).await?;
                    continue;
                }
            }

            if !instruction_is_runnable(instruction, &terminal_exec_ids) {
                continue;
            }

            self.launch_instruction(&parent, instruction, &resolver, token, now).await?;
            launched.push(instruction.execution_id.clone());
        }

        if !launched.is_empty() {
            return Ok(AdvanceOutcome::Launched(launched));
        }

        let children_now = self.process_store.children_of(process_id.as_str());
        if children_now.iter().any(|c| c.execution_status == ProcessStatus::Running) {
            return Ok(AdvanceOutcome::Blocked);
        }

        self.finalize_completed(&parent, &def.response_reference_map, &resolver, now, token).await
    }

    async fn finalize_failed(
        &self,
        parent: &Process,
        failed_child: &Process,
        now: DateTime<Utc>,
        token: Option<&str>,
    ) -> Result<AdvanceOutcome, EngineError> {
        let message = failed_child
            .status_message
            .clone()
            .or_else(|| Some(format!("child {} failed", failed_child.process_id)));
        match self.process_store.compare_and_transition(&parent.process_id, ProcessStatus::Failed, now, message, None) {
            Ok(updated) => {
                publish::tool_response(&self.event_bus, &updated, token).await?;
                Ok(AdvanceOutcome::Finalized(ProcessStatus::Failed))
            }
            Err(StoreError::NotRunning { .. }) => Ok(AdvanceOutcome::AlreadyTerminal),
            Err(e) => Err(e.into()),
        }
    }

    async fn finalize_completed(
        &self,
        parent: &Process,
        response_reference_map: &Option<std::collections::BTreeMap<String, String>>,
        resolver: &Resolver,
        now: DateTime<Utc>,
        token: Option<&str>,
    ) -> Result<AdvanceOutcome, EngineError> {
        let mut response: ToolIo = ToolIo::new();
        if let Some(map) = response_reference_map {
            for (name, ref_string) in map {
                let resolved = resolver.resolve(ref_string, token, self.file_fetcher.as_ref()).await?;
                response.insert(name.clone(), resolved_to_typed(resolved));
            }
        }
        let resp_path = paths::response_path(&parent.working_directory, &parent.process_id);
        put_json(self.storage.as_ref(), &resp_path, &response).await?;

        match self.process_store.compare_and_transition(
            &parent.process_id,
            ProcessStatus::Completed,
            now,
            None,
            Some(resp_path),
        ) {
            Ok(updated) => {
                publish::tool_response(&self.event_bus, &updated, token).await?;
                Ok(AdvanceOutcome::Finalized(ProcessStatus::Completed))
            }
            Err(StoreError::NotRunning { .. }) => Ok(AdvanceOutcome::AlreadyTerminal),
            Err(e) => Err(e.into()),
        }
    }

    async fn materialize_skipped(
        &self,
        parent: &Process,
        execution_id: &ExecutionId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let child_id = ProcessId::new();
        let resp_path = paths::response_path(&parent.working_directory, &child_id);
        put_json(self.storage.as_ref(), &resp_path, &ToolIo::new()).await?;

        let mut child = Process::new_child(
            child_id,
            parent.process_id.to_string(),
            execution_id.clone(),
            parent.process_owner.clone(),
            parent.working_directory.clone(),
            parent.websocket_connection_id.clone(),
            now,
        );
        child.finish(ProcessStatus::Skipped, now, Some("conditions evaluated false".to_string()), Some(resp_path));
        self.process_store.insert(child);
        Ok(())
    }

    async fn launch_instruction(
        &self,
        parent: &Process,
        instruction: &ratio_core::Instruction,
        resolver: &Resolver,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ProcessId, EngineError> {
        let tool_def = self.tool_source.load_instruction_tool(instruction).await?;
        let child_id = ProcessId::new();

        let mut resolved_args: ToolIo = ToolIo::new();
        for (name, value) in &instruction.arguments {
            let typed = self.materialize_argument(value, resolver, token).await?;
            resolved_args.insert(name.clone(), typed);
        }
        let args_path = paths::arguments_path(&parent.working_directory, &child_id);
        put_json(self.storage.as_ref(), &args_path, &resolved_args).await?;

        let mut child = Process::new_child(
            child_id,
            parent.process_id.to_string(),
            instruction.execution_id.clone(),
            parent.process_owner.clone(),
            parent.working_directory.clone(),
            parent.websocket_connection_id.clone(),
            now,
        );
        child.arguments_path = Some(args_path.clone());

        if tool_def.is_composite() {
            let def_path = paths::definition_path(&parent.working_directory, &child_id);
            put_json(self.storage.as_ref(), &def_path, &tool_def).await?;
            child.tool_definition_path = Some(def_path);
            self.process_store.insert(child);
            self.event_bus
                .publish("ratio::execute_composite_tool", serde_json::json!({"process_id": child_id}))
                .await?;
        } else {
            self.process_store.insert(child);
            let endpoint = tool_def
                .system_event_endpoint
                .clone()
                .ok_or(EngineError::MalformedTool("leaf tool missing system_event_endpoint"))?;
            let request = SystemExecuteToolRequest {
                arguments_path: Some(args_path),
                argument_schema: Some(tool_def.arguments.clone()),
                parent_process_id: parent.process_id.to_string(),
                process_id: child_id,
                response_schema: Some(tool_def.responses.clone()),
                token: token.unwrap_or_default().to_string(),
                working_directory: parent.working_directory.clone(),
            };
            self.event_bus.publish(&endpoint, serde_json::to_value(request)?).await?;
        }
        Ok(child_id)
    }

    async fn materialize_argument(
        &self,
        value: &serde_json::Value,
        resolver: &Resolver,
        token: Option<&str>,
    ) -> Result<ratio_core::TypedValue, EngineError> {
        if let Some(s) = value.as_str() {
            if Reference::looks_like_reference(s) {
                let resolved = resolver.resolve(s, token, self.file_fetcher.as_ref()).await?;
                return Ok(resolved_to_typed(resolved));
            }
        }
        Ok(json_literal_to_typed(value))
    }
}

/// An instruction is runnable once every sibling it references by
/// `REF:<execution_id>.…` has reached a terminal status
/// (SPEC_FULL.md §4.6 step 3). References into `arguments` never block —
/// the parent's own arguments are available from the moment it starts.
fn instruction_is_runnable(instruction: &ratio_core::Instruction, terminal_exec_ids: &HashSet<ExecutionId>) -> bool {
    for value in instruction.arguments.values() {
        let Some(s) = value.as_str() else { continue };
        if !Reference::looks_like_reference(s) {
            continue;
        }
        let Ok(reference) = Reference::parse(s) else { continue };
        if let RefContext::Sibling(execution_id) = reference.context {
            if !terminal_exec_ids.contains(&execution_id) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
