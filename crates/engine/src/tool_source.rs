// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves an instruction's `tool_definition` (inline) or
//! `tool_definition_path` (a Storage path) into a concrete
//! [`ToolDefinition`], the thing both the composite executor and the
//! gateway's validator-lookup need from Component D.

use crate::error::EngineError;
use async_trait::async_trait;
use ratio_adapters::{get_json, Storage};
use ratio_core::tool_definition::InstructionTool;
use ratio_core::{Instruction, ToolDefinition};
use std::sync::Arc;

#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn load_instruction_tool(&self, instruction: &Instruction) -> Result<ToolDefinition, EngineError>;
    async fn load_path(&self, path: &str) -> Result<ToolDefinition, EngineError>;
}

pub struct StorageToolSource {
    storage: Arc<dyn Storage>,
}

impl StorageToolSource {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ToolSource for StorageToolSource {
    async fn load_instruction_tool(&self, instruction: &Instruction) -> Result<ToolDefinition, EngineError> {
        match &instruction.tool {
            InstructionTool::Inline { tool_definition } => Ok((**tool_definition).clone()),
            InstructionTool::Path { tool_definition_path } => self.load_path(tool_definition_path).await,
        }
    }

    async fn load_path(&self, path: &str) -> Result<ToolDefinition, EngineError> {
        Ok(get_json(self.storage.as_ref(), path).await?)
    }
}
