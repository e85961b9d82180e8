use super::*;
use crate::executor::CompositeExecutor;
use crate::paths;
use crate::tool_source::StorageToolSource;
use chrono::Utc;
use ratio_adapters::{put_json, AuthorizedFileFetcher, InMemoryEventBus, LocalFsStorage};
use ratio_core::ids::ExecutionId;
use ratio_core::tool_definition::{ArgumentSpec, Instruction, InstructionTool};
use ratio_core::{Process, ProcessId, ProcessStatus, SystemExecuteToolResponse, ToolDefinition};
use ratio_store::ProcessStore;
use std::collections::BTreeMap;

struct AlwaysOk;
impl ratio_adapters::TokenVerifier for AlwaysOk {
    fn verify(&self, _token: &str) -> Result<ratio_adapters::Claims, ratio_adapters::AuthError> {
        Err(ratio_adapters::AuthError::Expired)
    }
}

fn echo_def() -> ToolDefinition {
    ToolDefinition {
        description: "echo".to_string(),
        arguments: vec![ArgumentSpec { name: "msg".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        responses: vec![ArgumentSpec { name: "reply".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        system_event_endpoint: Some("demo::echo".to_string()),
        instructions: None,
        response_reference_map: None,
    }
}

fn composite_def() -> ToolDefinition {
    ToolDefinition {
        description: "t2".to_string(),
        arguments: vec![ArgumentSpec { name: "input".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        responses: vec![ArgumentSpec { name: "out".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        system_event_endpoint: None,
        instructions: Some(vec![
            Instruction {
                execution_id: ExecutionId::new("first"),
                tool: InstructionTool::Path { tool_definition_path: "/tools/echo.json".to_string() },
                arguments: BTreeMap::from([("msg".to_string(), serde_json::json!("REF:arguments.input"))]),
                conditions: None,
                parallel_execution: false,
            },
            Instruction {
                execution_id: ExecutionId::new("second"),
                tool: InstructionTool::Path { tool_definition_path: "/tools/echo.json".to_string() },
                arguments: BTreeMap::from([("msg".to_string(), serde_json::json!("REF:first.reply"))]),
                conditions: None,
                parallel_execution: false,
            },
        ]),
        response_reference_map: Some(BTreeMap::from([("out".to_string(), "REF:second.reply".to_string())])),
    }
}

struct Fixture {
    handler: CompletionHandler,
    process_store: Arc<ProcessStore>,
    storage: Arc<dyn ratio_adapters::Storage>,
    root_id: ProcessId,
    first_child_id: ProcessId,
}

async fn setup() -> (Fixture, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let bus: Arc<dyn ratio_adapters::EventBus> = Arc::new(InMemoryEventBus::new());
    let storage: Arc<dyn ratio_adapters::Storage> = Arc::new(LocalFsStorage::new(dir.path(), bus.clone(), "actor"));
    put_json(storage.as_ref(), "/tools/echo.json", &echo_def()).await.unwrap();

    let tool_source: Arc<dyn ToolSource> = Arc::new(StorageToolSource::new(storage.clone()));
    let fetcher: Arc<dyn ratio_resolver::FileContentFetcher> = Arc::new(AuthorizedFileFetcher::new(storage.clone(), Arc::new(AlwaysOk)));
    let process_store = Arc::new(ProcessStore::new());

    let now = Utc::now();
    let root_id = ProcessId::new();
    let def_path = paths::definition_path("/work", &root_id);
    put_json(storage.as_ref(), &def_path, &composite_def()).await.unwrap();
    let args_path = paths::arguments_path("/work", &root_id);
    let args: crate::ToolIo = BTreeMap::from([("input".to_string(), ratio_core::TypedValue::String("hello".to_string()))]);
    put_json(storage.as_ref(), &args_path, &args).await.unwrap();

    let mut root = Process::new_root(root_id, "alice", "/work", now);
    root.tool_definition_path = Some(def_path);
    root.arguments_path = Some(args_path);
    process_store.insert(root);

    let executor = Arc::new(CompositeExecutor::new(process_store.clone(), storage.clone(), bus, tool_source, fetcher));
    executor.advance(root_id, Some("tok"), now).await.unwrap();
    let first_child_id = process_store.children_of(root_id.as_str())[0].process_id;

    let handler = CompletionHandler::new(process_store.clone(), executor);
    (Fixture { handler, process_store, storage, root_id, first_child_id }, dir)
}

#[tokio::test]
async fn completion_advances_the_parent_to_the_next_wave() {
    let (fixture, _dir) = setup().await;
    let resp_path = paths::response_path("/work", &fixture.first_child_id);
    let response: crate::ToolIo = BTreeMap::from([("reply".to_string(), ratio_core::TypedValue::String("hi".to_string()))]);
    put_json(fixture.storage.as_ref(), &resp_path, &response).await.unwrap();

    let result = SystemExecuteToolResponse {
        failure: None,
        parent_process_id: fixture.root_id.to_string(),
        process_id: fixture.first_child_id,
        response: Some(resp_path),
        status: "COMPLETED".to_string(),
        token: "tok".to_string(),
    };
    let outcome = fixture.handler.handle(result, Utc::now()).await.unwrap();
    assert_eq!(outcome, Some(AdvanceOutcome::Launched(vec![ExecutionId::new("second")])));

    let child = fixture.process_store.get(&fixture.first_child_id).unwrap();
    assert_eq!(child.execution_status, ProcessStatus::Completed);
}

#[tokio::test]
async fn a_failure_response_marks_the_process_failed_and_short_circuits_the_parent() {
    let (fixture, _dir) = setup().await;
    let result = SystemExecuteToolResponse {
        failure: Some("boom".to_string()),
        parent_process_id: fixture.root_id.to_string(),
        process_id: fixture.first_child_id,
        response: None,
        status: "FAILED".to_string(),
        token: "tok".to_string(),
    };
    let outcome = fixture.handler.handle(result, Utc::now()).await.unwrap();
    assert_eq!(outcome, Some(AdvanceOutcome::Finalized(ProcessStatus::Failed)));

    let root = fixture.process_store.get(&fixture.root_id).unwrap();
    assert_eq!(root.execution_status, ProcessStatus::Failed);
}

#[tokio::test]
async fn a_second_completion_for_the_same_process_is_ignored() {
    let (fixture, _dir) = setup().await;
    let first = SystemExecuteToolResponse {
        failure: None,
        parent_process_id: fixture.root_id.to_string(),
        process_id: fixture.first_child_id,
        response: None,
        status: "COMPLETED".to_string(),
        token: "tok".to_string(),
    };
    fixture.handler.handle(first.clone(), Utc::now()).await.unwrap();
    let outcome = fixture.handler.handle(first, Utc::now()).await.unwrap();
    assert_eq!(outcome, None);
}

#[tokio::test]
async fn a_response_for_a_root_process_has_no_parent_to_advance() {
    let (fixture, _dir) = setup().await;
    let result = SystemExecuteToolResponse {
        failure: None,
        parent_process_id: ratio_core::ids::SYSTEM_PARENT.to_string(),
        process_id: fixture.root_id,
        response: None,
        status: "COMPLETED".to_string(),
        token: "tok".to_string(),
    };
    let outcome = fixture.handler.handle(result, Utc::now()).await.unwrap();
    assert_eq!(outcome, None);
}
