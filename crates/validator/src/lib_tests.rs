// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ratio_core::Instruction;
use serde_json::json;
use std::collections::BTreeMap;

fn arg(name: &str, type_name: &str) -> ArgumentSpec {
    ArgumentSpec { name: name.to_string(), type_name: type_name.to_string(), required: true, description: String::new() }
}

fn leaf(arguments: Vec<ArgumentSpec>, responses: Vec<ArgumentSpec>) -> ToolDefinition {
    ToolDefinition {
        description: String::new(),
        arguments,
        responses,
        system_event_endpoint: Some("demo::echo".to_string()),
        instructions: None,
        response_reference_map: None,
    }
}

fn instruction(execution_id: &str, tool_definition_path: &str, arguments: BTreeMap<String, serde_json::Value>) -> Instruction {
    Instruction {
        execution_id: execution_id.into(),
        tool: InstructionTool::Path { tool_definition_path: tool_definition_path.to_string() },
        arguments,
        conditions: None,
        parallel_execution: false,
    }
}

struct MapLookup(BTreeMap<&'static str, ToolDefinition>);

impl ToolDefinitionLookup for MapLookup {
    fn resolve(&self, path: &str) -> Option<ToolDefinition> {
        self.0.get(path).cloned()
    }
}

#[test]
fn leaf_definition_passes() {
    let def = leaf(vec![arg("msg", "string")], vec![arg("reply", "string")]);
    assert!(validate(&def, &NoLookup).is_ok());
}

#[test]
fn rejects_definition_with_neither_endpoint_nor_instructions() {
    let mut def = leaf(vec![], vec![]);
    def.system_event_endpoint = None;
    let err = validate(&def, &NoLookup).unwrap_err();
    assert!(err.message.contains("found neither"));
}

#[test]
fn rejects_definition_with_both_endpoint_and_instructions() {
    let mut def = leaf(vec![], vec![]);
    def.instructions = Some(vec![]);
    let err = validate(&def, &NoLookup).unwrap_err();
    assert!(err.message.contains("found both"));
}

#[test]
fn rejects_duplicate_argument_name() {
    let def = leaf(vec![arg("msg", "string"), arg("msg", "number")], vec![]);
    let err = validate(&def, &NoLookup).unwrap_err();
    assert!(err.message.contains("duplicate field name"));
}

#[test]
fn rejects_unknown_type_name() {
    let def = leaf(vec![arg("msg", "bogus")], vec![]);
    let err = validate(&def, &NoLookup).unwrap_err();
    assert!(err.message.contains("unknown type_name"));
}

#[test]
fn rejects_duplicate_execution_id_among_siblings() {
    let echo = leaf(vec![arg("msg", "string")], vec![arg("reply", "string")]);
    let lookup = MapLookup(BTreeMap::from([("tools/echo.json", echo)]));

    let mut composite = leaf(vec![arg("input", "string")], vec![arg("out", "string")]);
    composite.system_event_endpoint = None;
    composite.instructions = Some(vec![
        instruction("first", "tools/echo.json", BTreeMap::from([("msg".to_string(), json!("REF:arguments.input"))])),
        instruction("first", "tools/echo.json", BTreeMap::from([("msg".to_string(), json!("REF:arguments.input"))])),
    ]);

    let err = validate(&composite, &lookup).unwrap_err();
    assert!(err.message.contains("duplicate execution_id"));
}

#[test]
fn rejects_reference_to_undeclared_argument() {
    let echo = leaf(vec![arg("msg", "string")], vec![arg("reply", "string")]);
    let lookup = MapLookup(BTreeMap::from([("tools/echo.json", echo)]));

    let mut composite = leaf(vec![arg("input", "string")], vec![arg("out", "string")]);
    composite.system_event_endpoint = None;
    composite.instructions = Some(vec![instruction(
        "first",
        "tools/echo.json",
        BTreeMap::from([("msg".to_string(), json!("REF:arguments.nonexistent"))]),
    )]);

    let err = validate(&composite, &lookup).unwrap_err();
    assert!(err.message.contains("undeclared argument"));
}

#[test]
fn rejects_reference_to_non_prior_sibling() {
    let echo = leaf(vec![arg("msg", "string")], vec![arg("reply", "string")]);
    let lookup = MapLookup(BTreeMap::from([("tools/echo.json", echo)]));

    let mut composite = leaf(vec![arg("input", "string")], vec![arg("out", "string")]);
    composite.system_event_endpoint = None;
    composite.instructions = Some(vec![instruction(
        "first",
        "tools/echo.json",
        BTreeMap::from([("msg".to_string(), json!("REF:second.reply"))]),
    )]);

    let err = validate(&composite, &lookup).unwrap_err();
    assert!(err.message.contains("not a prior sibling"));
}

#[test]
fn rejects_reference_to_undeclared_sibling_response() {
    let echo = leaf(vec![arg("msg", "string")], vec![arg("reply", "string")]);
    let lookup = MapLookup(BTreeMap::from([("tools/echo.json", echo)]));

    let mut composite = leaf(vec![arg("input", "string")], vec![arg("out", "string")]);
    composite.system_event_endpoint = None;
    composite.instructions = Some(vec![
        instruction("first", "tools/echo.json", BTreeMap::from([("msg".to_string(), json!("REF:arguments.input"))])),
        instruction("second", "tools/echo.json", BTreeMap::from([("msg".to_string(), json!("REF:first.nonexistent"))])),
    ]);

    let err = validate(&composite, &lookup).unwrap_err();
    assert!(err.message.contains("does not declare response"));
}

#[test]
fn rejects_incompatible_reference_type() {
    let echo = leaf(vec![arg("msg", "string")], vec![arg("reply", "string")]);
    let counter = leaf(vec![arg("n", "number")], vec![arg("total", "number")]);
    let lookup = MapLookup(BTreeMap::from([("tools/echo.json", echo), ("tools/counter.json", counter)]));

    let mut composite = leaf(vec![arg("input", "string")], vec![arg("out", "string")]);
    composite.system_event_endpoint = None;
    composite.instructions = Some(vec![
        instruction("first", "tools/echo.json", BTreeMap::from([("msg".to_string(), json!("REF:arguments.input"))])),
        instruction("second", "tools/counter.json", BTreeMap::from([("n".to_string(), json!("REF:first.reply"))])),
    ]);

    let err = validate(&composite, &lookup).unwrap_err();
    assert!(err.message.contains("declares \"number\""));
}

#[test]
fn accepts_valid_composite_with_response_reference_map() {
    let echo = leaf(vec![arg("msg", "string")], vec![arg("reply", "string")]);
    let lookup = MapLookup(BTreeMap::from([("tools/echo.json", echo)]));

    let mut composite = leaf(vec![arg("input", "string")], vec![arg("out", "string")]);
    composite.system_event_endpoint = None;
    composite.instructions = Some(vec![
        instruction("first", "tools/echo.json", BTreeMap::from([("msg".to_string(), json!("REF:arguments.input"))])),
        instruction("second", "tools/echo.json", BTreeMap::from([("msg".to_string(), json!("REF:first.reply"))])),
    ]);
    composite.response_reference_map = Some(BTreeMap::from([("out".to_string(), "REF:second.reply".to_string())]));

    assert!(validate(&composite, &lookup).is_ok());
}

#[test]
fn rejects_response_reference_map_pointing_at_unknown_execution_id() {
    let echo = leaf(vec![arg("msg", "string")], vec![arg("reply", "string")]);
    let lookup = MapLookup(BTreeMap::from([("tools/echo.json", echo)]));

    let mut composite = leaf(vec![arg("input", "string")], vec![arg("out", "string")]);
    composite.system_event_endpoint = None;
    composite.instructions = Some(vec![instruction(
        "first",
        "tools/echo.json",
        BTreeMap::from([("msg".to_string(), json!("REF:arguments.input"))]),
    )]);
    composite.response_reference_map = Some(BTreeMap::from([("out".to_string(), "REF:ghost.reply".to_string())]));

    let err = validate(&composite, &lookup).unwrap_err();
    assert!(err.message.contains("unknown execution_id"));
}

#[test]
fn literal_argument_values_are_not_reference_checked() {
    let echo = leaf(vec![arg("msg", "string")], vec![arg("reply", "string")]);
    let lookup = MapLookup(BTreeMap::from([("tools/echo.json", echo)]));

    let mut composite = leaf(vec![], vec![arg("out", "string")]);
    composite.system_event_endpoint = None;
    composite.instructions = Some(vec![instruction(
        "first",
        "tools/echo.json",
        BTreeMap::from([("msg".to_string(), json!("a plain literal"))]),
    )]);

    assert!(validate(&composite, &lookup).is_ok());
}
