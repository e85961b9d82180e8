//! S4 — reference type mismatch (spec.md §8): an instruction consuming a
//! sibling's `number` response into a `list`-typed argument is rejected
//! by the validator before `execute` writes any process record.

use crate::support::Harness;
use ratio_core::tool_definition::{ArgumentSpec, Instruction, InstructionTool, ToolDefinition};
use ratio_core::ExecutionId;
use ratio_engine::{ToolDefinitionRef, ToolIo};
use std::collections::BTreeMap;

fn counter_leaf() -> ToolDefinition {
    ToolDefinition {
        description: "returns a count".to_string(),
        arguments: vec![],
        responses: vec![ArgumentSpec { name: "count".to_string(), type_name: "number".to_string(), required: true, description: String::new() }],
        system_event_endpoint: Some("demo::count".to_string()),
        instructions: None,
        response_reference_map: None,
    }
}

fn list_consumer_leaf() -> ToolDefinition {
    ToolDefinition {
        description: "wants a list".to_string(),
        arguments: vec![ArgumentSpec { name: "items".to_string(), type_name: "list".to_string(), required: true, description: String::new() }],
        responses: vec![ArgumentSpec { name: "ok".to_string(), type_name: "boolean".to_string(), required: true, description: String::new() }],
        system_event_endpoint: Some("demo::consume".to_string()),
        instructions: None,
        response_reference_map: None,
    }
}

fn mismatched_composite() -> ToolDefinition {
    ToolDefinition {
        description: "t-mismatch".to_string(),
        arguments: vec![],
        responses: vec![ArgumentSpec { name: "out".to_string(), type_name: "boolean".to_string(), required: true, description: String::new() }],
        system_event_endpoint: None,
        instructions: Some(vec![
            Instruction {
                execution_id: ExecutionId::new("first"),
                tool: InstructionTool::Inline { tool_definition: Box::new(counter_leaf()) },
                arguments: BTreeMap::new(),
                conditions: None,
                parallel_execution: false,
            },
            Instruction {
                execution_id: ExecutionId::new("second"),
                tool: InstructionTool::Inline { tool_definition: Box::new(list_consumer_leaf()) },
                arguments: BTreeMap::from([("items".to_string(), serde_json::json!("REF:first.count"))]),
                conditions: None,
                parallel_execution: false,
            },
        ]),
        response_reference_map: Some(BTreeMap::from([("out".to_string(), "REF:second.ok".to_string())])),
    }
}

#[tokio::test]
async fn number_into_list_argument_is_rejected_before_any_process_is_written() {
    let harness = Harness::new().await;

    let result = harness
        .launcher
        .execute(ToolDefinitionRef::Inline(mismatched_composite()), ToolIo::new(), "alice", "/work", None, None, chrono::Utc::now())
        .await;

    let err = result.expect_err("a number-into-list reference must fail validation");
    match err {
        ratio_engine::EngineError::Validation(validation_err) => {
            assert_eq!(validation_err.path, "instructions[1].arguments.items");
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
    assert!(harness.process_store.children_of("SYSTEM").is_empty());
}
