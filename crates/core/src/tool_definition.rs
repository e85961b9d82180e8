// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative tool definitions: leaf tools and composite instruction graphs.

use crate::ids::ExecutionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry in an argument or response schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// One node of a composite tool's instruction graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    /// Unique within the parent's instruction list.
    pub execution_id: ExecutionId,
    #[serde(flatten)]
    pub tool: InstructionTool,
    /// Values may be literals or `REF:…` strings.
    pub arguments: BTreeMap<String, serde_json::Value>,
    /// Boolean expression; unresolvable/false means the instruction is
    /// materialized `SKIPPED` with an empty response.
    pub conditions: Option<serde_json::Value>,
    #[serde(default)]
    pub parallel_execution: bool,
}

/// Either an inline definition or a path to one — exactly one is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstructionTool {
    Inline { tool_definition: Box<ToolDefinition> },
    Path { tool_definition_path: String },
}

/// A declarative tool: either a leaf (has `system_event_endpoint`) or a
/// composite (has `instructions`) — exactly one of the two is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(default)]
    pub description: String,
    pub arguments: Vec<ArgumentSpec>,
    pub responses: Vec<ArgumentSpec>,
    pub system_event_endpoint: Option<String>,
    pub instructions: Option<Vec<Instruction>>,
    /// Present only on composites: response name -> `REF:…` string,
    /// resolved at composite completion time.
    pub response_reference_map: Option<BTreeMap<String, String>>,
}

impl ToolDefinition {
    pub fn is_leaf(&self) -> bool {
        self.system_event_endpoint.is_some()
    }

    pub fn is_composite(&self) -> bool {
        self.instructions.is_some()
    }
}
