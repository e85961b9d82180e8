//! S1 — leaf happy path (spec.md §8).
//!
//! A leaf definition's `msg` argument round-trips to `reply` via a test
//! double standing in for the leaf handler: it receives the published
//! `demo::echo` event and answers on `ratio::tool_response` itself.

use crate::support::{echo_leaf, Harness};
use ratio_adapters::get_json;
use ratio_core::{ProcessStatus, SystemExecuteToolRequest, SystemExecuteToolResponse};
use ratio_engine::{ToolDefinitionRef, ToolIo};
use std::collections::BTreeMap;

#[tokio::test]
async fn leaf_process_runs_to_completed_with_its_response_persisted() {
    let harness = Harness::new().await;
    let mut endpoint_rx = harness.event_bus.subscribe("demo::echo");

    let arguments: ToolIo = BTreeMap::from([("msg".to_string(), ratio_core::TypedValue::String("hi".to_string()))]);
    let process_id = harness
        .launcher
        .execute(ToolDefinitionRef::Inline(echo_leaf()), arguments, "alice", "/work", None, Some("tok"), chrono::Utc::now())
        .await
        .unwrap();

    let process = harness.process_store.get(&process_id).unwrap();
    assert_eq!(process.execution_status, ProcessStatus::Running);

    // The leaf-handler test double: receive the dispatch, write a response
    // file, and answer with a completion event — standing in for a real
    // subscriber on the `demo::echo` topic (spec.md §1).
    let dispatched: SystemExecuteToolRequest = serde_json::from_value(endpoint_rx.recv().await.unwrap()).unwrap();
    assert_eq!(dispatched.process_id, process_id);
    let response: ToolIo = BTreeMap::from([("reply".to_string(), ratio_core::TypedValue::String("hi".to_string()))]);
    let response_path = format!("{}/response.json", process.working_directory);
    ratio_adapters::put_json(harness.storage.as_ref(), &response_path, &response).await.unwrap();

    harness
        .completion
        .handle(
            SystemExecuteToolResponse {
                failure: None,
                parent_process_id: dispatched.parent_process_id,
                process_id: dispatched.process_id,
                response: Some(response_path.clone()),
                status: "COMPLETED".to_string(),
                token: "tok".to_string(),
            },
            chrono::Utc::now(),
        )
        .await
        .unwrap();

    let completed = harness.process_store.get(&process_id).unwrap();
    assert_eq!(completed.execution_status, ProcessStatus::Completed);
    assert!(completed.ended_on.is_some());
    let persisted: ToolIo = get_json(harness.storage.as_ref(), &completed.response_path.unwrap()).await.unwrap();
    assert_eq!(persisted.get("reply"), Some(&ratio_core::TypedValue::String("hi".to_string())));
}
