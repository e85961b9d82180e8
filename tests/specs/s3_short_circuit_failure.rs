//! S3 — short-circuit failure (spec.md §8): a composite with two parallel
//! children fails the parent the moment either child fails, and a later
//! completion from the other child must not reopen the terminal parent.

use crate::support::{boom_leaf, echo_leaf, Harness};
use ratio_core::tool_definition::{ArgumentSpec, Instruction, InstructionTool, ToolDefinition};
use ratio_core::{ExecutionId, ProcessStatus, SystemExecuteToolRequest, SystemExecuteToolResponse};
use ratio_engine::{ToolDefinitionRef, ToolIo};
use std::collections::BTreeMap;

fn parallel_pair() -> ToolDefinition {
    ToolDefinition {
        description: "parallel pair, one doomed".to_string(),
        arguments: vec![ArgumentSpec { name: "input".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        responses: vec![ArgumentSpec { name: "out".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        system_event_endpoint: None,
        instructions: Some(vec![
            Instruction {
                execution_id: ExecutionId::new("ok"),
                tool: InstructionTool::Inline { tool_definition: Box::new(echo_leaf()) },
                arguments: BTreeMap::from([("msg".to_string(), serde_json::json!("REF:arguments.input"))]),
                conditions: None,
                parallel_execution: true,
            },
            Instruction {
                execution_id: ExecutionId::new("doomed"),
                tool: InstructionTool::Inline { tool_definition: Box::new(boom_leaf()) },
                arguments: BTreeMap::from([("msg".to_string(), serde_json::json!("REF:arguments.input"))]),
                conditions: None,
                parallel_execution: true,
            },
        ]),
        response_reference_map: Some(BTreeMap::from([("out".to_string(), "REF:ok.reply".to_string())])),
    }
}

#[tokio::test]
async fn failed_child_finalizes_parent_and_later_sibling_completion_is_a_no_op() {
    let harness = Harness::new().await;
    let mut echo_rx = harness.event_bus.subscribe("demo::echo");
    let mut boom_rx = harness.event_bus.subscribe("demo::boom");

    let arguments: ToolIo = BTreeMap::from([("input".to_string(), ratio_core::TypedValue::String("hello".to_string()))]);
    let process_id = harness
        .launcher
        .execute(ToolDefinitionRef::Inline(parallel_pair()), arguments, "alice", "/work", None, Some("tok"), chrono::Utc::now())
        .await
        .unwrap();

    // Both parallel children are runnable in the first wave; neither
    // references the other, so both launch together.
    harness.executor.advance(process_id, Some("tok"), chrono::Utc::now()).await.unwrap();
    assert_eq!(harness.process_store.children_of(process_id.as_str()).len(), 2);

    let doomed_request: SystemExecuteToolRequest = serde_json::from_value(boom_rx.recv().await.unwrap()).unwrap();
    harness
        .completion
        .handle(
            SystemExecuteToolResponse {
                failure: Some("always fails".to_string()),
                parent_process_id: doomed_request.parent_process_id,
                process_id: doomed_request.process_id,
                response: None,
                status: "FAILED".to_string(),
                token: doomed_request.token,
            },
            chrono::Utc::now(),
        )
        .await
        .unwrap();

    let parent = harness.process_store.get(&process_id).unwrap();
    assert_eq!(parent.execution_status, ProcessStatus::Failed);
    let failed_at = parent.ended_on.unwrap();

    // The still-running sibling later completes too; its event must not
    // reopen or otherwise mutate the already-terminal parent.
    let ok_request: SystemExecuteToolRequest = serde_json::from_value(echo_rx.recv().await.unwrap()).unwrap();
    let response: ToolIo = BTreeMap::from([("reply".to_string(), ratio_core::TypedValue::String("hello".to_string()))]);
    let response_path = format!("{}/response-ok.json", ok_request.working_directory);
    ratio_adapters::put_json(harness.storage.as_ref(), &response_path, &response).await.unwrap();
    let outcome = harness
        .completion
        .handle(
            SystemExecuteToolResponse {
                failure: None,
                parent_process_id: ok_request.parent_process_id,
                process_id: ok_request.process_id,
                response: Some(response_path),
                status: "COMPLETED".to_string(),
                token: ok_request.token,
            },
            chrono::Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(outcome, Some(ratio_engine::AdvanceOutcome::AlreadyTerminal));

    let parent_after = harness.process_store.get(&process_id).unwrap();
    assert_eq!(parent_after.execution_status, ProcessStatus::Failed);
    assert_eq!(parent_after.ended_on.unwrap(), failed_at);
}
