//! S2 — composite wave join (spec.md §8, "t2"): `second` references
//! `first`'s response, so it must not launch until `first` is terminal,
//! and the parent's own response is assembled from `second`'s output.

use crate::support::{echo_leaf, Harness};
use ratio_core::tool_definition::{ArgumentSpec, Instruction, InstructionTool, ToolDefinition};
use ratio_core::{ExecutionId, ProcessStatus, SystemExecuteToolRequest, SystemExecuteToolResponse};
use ratio_engine::{ToolDefinitionRef, ToolIo};
use std::collections::BTreeMap;

fn t2() -> ToolDefinition {
    ToolDefinition {
        description: "t2".to_string(),
        arguments: vec![ArgumentSpec { name: "input".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        responses: vec![ArgumentSpec { name: "out".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        system_event_endpoint: None,
        instructions: Some(vec![
            Instruction {
                execution_id: ExecutionId::new("first"),
                tool: InstructionTool::Inline { tool_definition: Box::new(echo_leaf()) },
                arguments: BTreeMap::from([("msg".to_string(), serde_json::json!("REF:arguments.input"))]),
                conditions: None,
                parallel_execution: false,
            },
            Instruction {
                execution_id: ExecutionId::new("second"),
                tool: InstructionTool::Inline { tool_definition: Box::new(echo_leaf()) },
                arguments: BTreeMap::from([("msg".to_string(), serde_json::json!("REF:first.reply"))]),
                conditions: None,
                parallel_execution: false,
            },
        ]),
        response_reference_map: Some(BTreeMap::from([("out".to_string(), "REF:second.reply".to_string())])),
    }
}

async fn respond_to_next_dispatch(
    harness: &Harness,
    endpoint_rx: &mut tokio::sync::mpsc::Receiver<serde_json::Value>,
) {
    let dispatched: SystemExecuteToolRequest = serde_json::from_value(endpoint_rx.recv().await.unwrap()).unwrap();
    let response: ToolIo = BTreeMap::from([("reply".to_string(), ratio_core::TypedValue::String("hello".to_string()))]);
    let response_path = format!("{}/response-{}.json", dispatched.working_directory, dispatched.process_id);
    ratio_adapters::put_json(harness.storage.as_ref(), &response_path, &response).await.unwrap();
    harness
        .completion
        .handle(
            SystemExecuteToolResponse {
                failure: None,
                parent_process_id: dispatched.parent_process_id,
                process_id: dispatched.process_id,
                response: Some(response_path),
                status: "COMPLETED".to_string(),
                token: dispatched.token,
            },
            chrono::Utc::now(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn second_instruction_waits_for_first_then_parent_completes_with_joined_response() {
    let harness = Harness::new().await;
    let mut endpoint_rx = harness.event_bus.subscribe("demo::echo");

    let arguments: ToolIo = BTreeMap::from([("input".to_string(), ratio_core::TypedValue::String("hello".to_string()))]);
    let process_id = harness
        .launcher
        .execute(ToolDefinitionRef::Inline(t2()), arguments, "alice", "/work", None, Some("tok"), chrono::Utc::now())
        .await
        .unwrap();

    // First wave: only `first` is runnable, `second` references it and
    // must stay un-launched until `first` reaches a terminal status.
    harness.executor.advance(process_id, Some("tok"), chrono::Utc::now()).await.unwrap();
    let children = harness.process_store.children_of(process_id.as_str());
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].execution_id.as_ref().unwrap().as_str(), "first");

    // Completing `first` re-enters the executor and launches `second`.
    respond_to_next_dispatch(&harness, &mut endpoint_rx).await;
    let children = harness.process_store.children_of(process_id.as_str());
    assert_eq!(children.len(), 2);

    // Completing `second` finalizes the parent.
    respond_to_next_dispatch(&harness, &mut endpoint_rx).await;

    let parent = harness.process_store.get(&process_id).unwrap();
    assert_eq!(parent.execution_status, ProcessStatus::Completed);
    let response: ToolIo = ratio_adapters::get_json(harness.storage.as_ref(), parent.response_path.as_ref().unwrap()).await.unwrap();
    assert_eq!(response.get("out"), Some(&ratio_core::TypedValue::String("hello".to_string())));
}
