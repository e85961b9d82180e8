//! S6 — stuck-parent recovery (spec.md §8): if the event carrying a
//! child's completion is lost (so the executor never gets re-entered for
//! the parent), the next reconciliation pass finds the parent with every
//! child terminal and finalizes it.

use crate::support::{echo_leaf, Harness};
use ratio_core::tool_definition::{ArgumentSpec, Instruction, InstructionTool, ToolDefinition};
use ratio_core::{ExecutionId, GlobalSettings, ProcessStatus, SystemExecuteToolRequest, SystemExecuteToolResponse};
use ratio_engine::{ToolDefinitionRef, ToolIo};
use std::collections::BTreeMap;

fn two_leaf_composite() -> ToolDefinition {
    ToolDefinition {
        description: "two independent leaves".to_string(),
        arguments: vec![ArgumentSpec { name: "input".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        responses: vec![ArgumentSpec { name: "out".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        system_event_endpoint: None,
        instructions: Some(vec![
            Instruction {
                execution_id: ExecutionId::new("a"),
                tool: InstructionTool::Inline { tool_definition: Box::new(echo_leaf()) },
                arguments: BTreeMap::from([("msg".to_string(), serde_json::json!("REF:arguments.input"))]),
                conditions: None,
                parallel_execution: true,
            },
            Instruction {
                execution_id: ExecutionId::new("b"),
                tool: InstructionTool::Inline { tool_definition: Box::new(echo_leaf()) },
                arguments: BTreeMap::from([("msg".to_string(), serde_json::json!("REF:arguments.input"))]),
                conditions: None,
                parallel_execution: true,
            },
        ]),
        response_reference_map: Some(BTreeMap::from([("out".to_string(), "REF:a.reply".to_string())])),
    }
}

#[tokio::test]
async fn reconciler_finalizes_a_parent_whose_last_completion_event_was_dropped() {
    let harness = Harness::new().await;
    let mut endpoint_rx = harness.event_bus.subscribe("demo::echo");

    let arguments: ToolIo = BTreeMap::from([("input".to_string(), ratio_core::TypedValue::String("hi".to_string()))]);
    let process_id = harness
        .launcher
        .execute(ToolDefinitionRef::Inline(two_leaf_composite()), arguments, "alice", "/work", None, Some("tok"), chrono::Utc::now())
        .await
        .unwrap();
    harness.executor.advance(process_id, Some("tok"), chrono::Utc::now()).await.unwrap();
    assert_eq!(harness.process_store.children_of(process_id.as_str()).len(), 2);

    // Child `a` completes normally, through the Completion Handler.
    let request_a: SystemExecuteToolRequest = serde_json::from_value(endpoint_rx.recv().await.unwrap()).unwrap();
    let response: ToolIo = BTreeMap::from([("reply".to_string(), ratio_core::TypedValue::String("hi".to_string()))]);
    let response_path_a = format!("{}/response-a.json", request_a.working_directory);
    ratio_adapters::put_json(harness.storage.as_ref(), &response_path_a, &response).await.unwrap();
    harness
        .completion
        .handle(
            SystemExecuteToolResponse {
                failure: None,
                parent_process_id: request_a.parent_process_id,
                process_id: request_a.process_id,
                response: Some(response_path_a),
                status: "COMPLETED".to_string(),
                token: request_a.token,
            },
            chrono::Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(harness.process_store.get(&process_id).unwrap().execution_status, ProcessStatus::Running);

    // Child `b` also completes, but its `ratio::tool_response` event is
    // lost in transit: the process record is terminal, yet nothing ever
    // re-enters the parent's executor for it.
    let request_b: SystemExecuteToolRequest = serde_json::from_value(endpoint_rx.recv().await.unwrap()).unwrap();
    let response_path_b = format!("{}/response-b.json", request_b.working_directory);
    ratio_adapters::put_json(harness.storage.as_ref(), &response_path_b, &response).await.unwrap();
    harness
        .process_store
        .compare_and_transition(&request_b.process_id, ProcessStatus::Completed, chrono::Utc::now(), None, Some(response_path_b))
        .unwrap();

    // Still stuck: every child terminal, parent still RUNNING.
    assert_eq!(harness.process_store.get(&process_id).unwrap().execution_status, ProcessStatus::Running);

    let report = harness.reconciler.reconcile(chrono::Utc::now(), &GlobalSettings::default()).await.unwrap();
    assert_eq!(report.stuck_parents_advanced, 1);

    let parent = harness.process_store.get(&process_id).unwrap();
    assert_eq!(parent.execution_status, ProcessStatus::Completed);
}
