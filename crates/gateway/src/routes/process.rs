// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/process/*` — the Process Manager API (Component H, SPEC_FULL.md §4.5/§6).

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use ratio_core::{Process, ProcessId, ProcessStatus, ToolDefinition};
use ratio_engine::tool_source::ToolSource;
use ratio_engine::ToolDefinitionRef;
use ratio_validator::{validate, NoLookup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Exactly one of `tool_definition`/`tool_definition_path` must be present
/// (spec.md §6).
#[derive(Debug, Deserialize)]
pub struct DefinitionRefBody {
    pub tool_definition: Option<ToolDefinition>,
    pub tool_definition_path: Option<String>,
}

fn definition_ref(body: &DefinitionRefBody) -> Result<ToolDefinitionRef, ApiError> {
    match (&body.tool_definition, &body.tool_definition_path) {
        (Some(def), None) => Ok(ToolDefinitionRef::Inline(def.clone())),
        (None, Some(path)) => Ok(ToolDefinitionRef::Path(path.clone())),
        _ => Err(ApiError::Validation(ratio_validator::ValidationError { path: String::new(), message: "exactly one of tool_definition or tool_definition_path must be present".to_string() })),
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    #[serde(flatten)]
    pub definition: DefinitionRefBody,
    #[serde(default)]
    pub arguments: BTreeMap<String, serde_json::Value>,
    /// Admin-only impersonation; defaults to the caller.
    pub execute_as: Option<String>,
    pub working_directory: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub process_id: ProcessId,
}

pub async fn execute(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let owner = match &body.execute_as {
        Some(target) if target != &auth.claims.sub => {
            if !auth.claims.admin {
                return Err(ApiError::Auth(ratio_adapters::AuthError::NotOwnerOrAdmin));
            }
            target.clone()
        }
        Some(target) => target.clone(),
        None => auth.claims.sub.clone(),
    };
    let working_directory = body.working_directory.unwrap_or_else(|| auth.claims.home.clone());
    let arguments = ratio_engine::convert::json_literal_to_typed(&serde_json::Value::Object(
        body.arguments.into_iter().collect(),
    ));
    let arguments = match arguments {
        ratio_core::TypedValue::Object(map) => map,
        _ => BTreeMap::new(),
    };

    let definition_ref = definition_ref(&body.definition)?;
    let process_id = state
        .launcher
        .execute(definition_ref, arguments, owner, working_directory, None, Some(&auth.token), Utc::now())
        .await?;
    Ok(Json(ExecuteResponse { process_id }))
}

#[derive(Debug, Deserialize)]
pub struct DescribeProcessRequest {
    pub process_id: String,
}

pub async fn describe_process(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<DescribeProcessRequest>,
) -> Result<Json<Process>, ApiError> {
    let process_id = ProcessId::from_string(&body.process_id);
    let process = state.process_store.get(&process_id).ok_or_else(|| ApiError::NotFound(format!("no process {}", body.process_id)))?;
    auth.require_owner_or_admin(&process.process_owner)?;
    Ok(Json(process))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProcessesRequest {
    pub process_owner: Option<String>,
    pub parent_process_id: Option<String>,
    pub status: Option<ProcessStatus>,
}

#[derive(Debug, Serialize)]
pub struct ListProcessesResponse {
    pub processes: Vec<Process>,
}

pub async fn list_processes(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<ListProcessesRequest>,
) -> Result<Json<ListProcessesResponse>, ApiError> {
    let mut processes = match &body.parent_process_id {
        Some(parent) => state.process_store.children_of(parent),
        None => state.process_store.all(),
    };
    processes.retain(|p| auth.claims.is_owner_or_admin(&p.process_owner));
    if let Some(owner) = &body.process_owner {
        processes.retain(|p| &p.process_owner == owner);
    }
    if let Some(status) = body.status {
        processes.retain(|p| p.execution_status == status);
    }
    Ok(Json(ListProcessesResponse { processes }))
}

pub async fn validate_definition(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
    Json(body): Json<DefinitionRefBody>,
) -> Result<(), ApiError> {
    match (&body.tool_definition, &body.tool_definition_path) {
        (Some(def), None) => {
            validate(def, &NoLookup)?;
            Ok(())
        }
        (None, Some(path)) => {
            let tool_source = ratio_engine::tool_source::StorageToolSource::new(state.storage.clone());
            let def = tool_source.load_path(path).await?;
            let lookup = ratio_engine::prefetch_lookup(&tool_source, &def).await?;
            validate(&def, &lookup)?;
            Ok(())
        }
        _ => Err(ApiError::Validation(ratio_validator::ValidationError {
            path: String::new(),
            message: "exactly one of tool_definition or tool_definition_path must be present".to_string(),
        })),
    }
}
