// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Tool-Definition Validator (Component G).
//!
//! Total: run both at `/process/validate` and immediately before
//! `/process/execute` writes any process record. Returns a single
//! structured error carrying a path pointer into the definition
//! (`"instructions[2].arguments.msg"`).

use ratio_core::tool_definition::InstructionTool;
use ratio_core::{ArgumentSpec, ToolDefinition};
use ratio_resolver::{RefContext, Reference};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("validation failed at {path}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

/// Resolves a `tool_definition_path` to its schema, for reference
/// type-compatibility checks against instructions that reference a
/// non-inline tool. Backed by the Storage (D) contract in the daemon.
pub trait ToolDefinitionLookup {
    fn resolve(&self, path: &str) -> Option<ToolDefinition>;
}

/// A lookup that never resolves anything — used when only structural
/// validation (no storage access) is desired.
pub struct NoLookup;

impl ToolDefinitionLookup for NoLookup {
    fn resolve(&self, _path: &str) -> Option<ToolDefinition> {
        None
    }
}

/// Validate a tool definition. See module docs for when this must run.
pub fn validate(def: &ToolDefinition, lookup: &dyn ToolDefinitionLookup) -> Result<(), ValidationError> {
    validate_schema_list(&def.arguments, "arguments")?;
    validate_schema_list(&def.responses, "responses")?;

    match (def.is_leaf(), def.is_composite()) {
        (true, true) => {
            return Err(ValidationError::at(
                "",
                "exactly one of system_event_endpoint or instructions must be present, found both",
            ))
        }
        (false, false) => {
            return Err(ValidationError::at(
                "",
                "exactly one of system_event_endpoint or instructions must be present, found neither",
            ))
        }
        _ => {}
    }

    if let Some(instructions) = &def.instructions {
        let mut declared_schemas: Vec<(&str, Vec<ArgumentSpec>)> = Vec::new();
        let mut seen_execution_ids = HashSet::new();

        for (index, instruction) in instructions.iter().enumerate() {
            let base = format!("instructions[{index}]");
            let execution_id = instruction.execution_id.as_str();

            if !seen_execution_ids.insert(execution_id.to_string()) {
                return Err(ValidationError::at(
                    format!("{base}.execution_id"),
                    format!("duplicate execution_id {execution_id:?} among siblings"),
                ));
            }

            let (target_arguments, target_responses) = match &instruction.tool {
                InstructionTool::Inline { tool_definition } => {
                    validate(tool_definition, lookup)
                        .map_err(|e| ValidationError::at(format!("{base}.tool_definition.{}", e.path), e.message))?;
                    (tool_definition.arguments.clone(), tool_definition.responses.clone())
                }
                InstructionTool::Path { tool_definition_path } => match lookup.resolve(tool_definition_path) {
                    Some(resolved) => (resolved.arguments.clone(), resolved.responses.clone()),
                    None => (Vec::new(), Vec::new()),
                },
            };

            for (arg_name, arg_value) in &instruction.arguments {
                let arg_path = format!("{base}.arguments.{arg_name}");
                let Some(json_string) = arg_value.as_str() else { continue };
                if !Reference::looks_like_reference(json_string) {
                    continue;
                }
                let reference = Reference::parse(json_string)
                    .map_err(|e| ValidationError::at(&arg_path, e.to_string()))?;

                let declared_type = target_arguments.iter().find(|a| a.name == *arg_name).map(|a| a.type_name.as_str());

                match &reference.context {
                    RefContext::Arguments => {
                        if !def.arguments.iter().any(|a| a.name == reference.key) {
                            return Err(ValidationError::at(
                                &arg_path,
                                format!("references undeclared argument {:?}", reference.key),
                            ));
                        }
                    }
                    RefContext::Sibling(sibling_id) => {
                        let sibling_id = sibling_id.as_str();
                        let prior = declared_schemas.iter().find(|(id, _)| *id == sibling_id);
                        let Some((_, responses)) = prior else {
                            return Err(ValidationError::at(
                                &arg_path,
                                format!(
                                    "references {sibling_id:?}, which is not a prior sibling's execution_id"
                                ),
                            ));
                        };
                        let sibling_response = responses.iter().find(|r| r.name == reference.key);
                        let Some(sibling_response) = sibling_response else {
                            return Err(ValidationError::at(
                                &arg_path,
                                format!("sibling {sibling_id:?} does not declare response {:?}", reference.key),
                            ));
                        };
                        if let Some(declared_type) = declared_type {
                            if reference.attribute.is_none() && sibling_response.type_name != declared_type {
                                return Err(ValidationError::at(
                                    &arg_path,
                                    format!(
                                        "reference resolves to {:?} but argument {arg_name:?} declares {declared_type:?}",
                                        sibling_response.type_name
                                    ),
                                ));
                            }
                        }
                    }
                }
            }

            declared_schemas.push((execution_id, target_responses));
        }

        if let Some(response_map) = &def.response_reference_map {
            for (name, ref_string) in response_map {
                let path = format!("response_reference_map.{name}");
                if !Reference::looks_like_reference(ref_string) {
                    return Err(ValidationError::at(&path, "response_reference_map values must be REF: strings"));
                }
                let reference = Reference::parse(ref_string).map_err(|e| ValidationError::at(&path, e.to_string()))?;
                if let RefContext::Sibling(sibling_id) = &reference.context {
                    if !seen_execution_ids.contains(sibling_id.as_str()) {
                        return Err(ValidationError::at(
                            &path,
                            format!("references unknown execution_id {:?}", sibling_id.as_str()),
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}

fn validate_schema_list(specs: &[ArgumentSpec], label: &str) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for (index, spec) in specs.iter().enumerate() {
        let path = format!("{label}[{index}]");
        if spec.name.is_empty() {
            return Err(ValidationError::at(&path, "name must not be empty"));
        }
        if !seen.insert(spec.name.clone()) {
            return Err(ValidationError::at(&path, format!("duplicate field name {:?}", spec.name)));
        }
        if !matches!(spec.type_name.as_str(), "string" | "number" | "boolean" | "list" | "object" | "file") {
            return Err(ValidationError::at(&path, format!("unknown type_name {:?}", spec.type_name)));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
