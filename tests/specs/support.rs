//! Shared harness for the end-to-end scenarios in spec.md §8: wires
//! Components F/G/H/I/J/K/L together over in-memory/local-disk test
//! doubles for the external collaborators C/D/E, exactly like a single
//! `ratiod` process would, minus the HTTP layer.

use ratio_adapters::{put_json, AuthorizedFileFetcher, Claims, EventBus, InMemoryEventBus, LocalFsStorage, Storage, TokenVerifier};
use ratio_core::tool_definition::{ArgumentSpec, ToolDefinition};
use ratio_engine::{CompletionHandler, CompositeExecutor, ProcessLauncher, Reconciler, StorageToolSource, ToolSource};
use ratio_resolver::FileContentFetcher;
use ratio_store::ProcessStore;
use std::sync::Arc;

/// Verifies any non-empty token — the scenarios below only need a
/// plausible bearer token to thread through, not real signature checks.
pub struct AcceptAnyToken;

impl TokenVerifier for AcceptAnyToken {
    fn verify(&self, token: &str) -> Result<Claims, ratio_adapters::AuthError> {
        if token.is_empty() {
            return Err(ratio_adapters::AuthError::Malformed("empty token".to_string()));
        }
        Ok(Claims {
            sub: "alice".to_string(),
            auth_grps: vec![],
            p_grp: "eng".to_string(),
            admin: false,
            home: "/work".to_string(),
            iat: 0,
            exp: i64::MAX,
            iss: "ratio".to_string(),
            cus: None,
        })
    }
}

pub struct Harness {
    pub process_store: Arc<ProcessStore>,
    pub storage: Arc<dyn Storage>,
    pub event_bus: Arc<dyn EventBus>,
    pub tool_source: Arc<dyn ToolSource>,
    pub launcher: Arc<ProcessLauncher>,
    pub executor: Arc<CompositeExecutor>,
    pub completion: Arc<CompletionHandler>,
    pub reconciler: Arc<Reconciler>,
    pub file_fetcher: Arc<dyn FileContentFetcher>,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let event_bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
        let storage: Arc<dyn Storage> = Arc::new(LocalFsStorage::new(dir.path(), event_bus.clone(), "test-actor"));
        let tool_source: Arc<dyn ToolSource> = Arc::new(StorageToolSource::new(storage.clone()));
        let verifier: Arc<dyn TokenVerifier> = Arc::new(AcceptAnyToken);
        let file_fetcher: Arc<dyn FileContentFetcher> = Arc::new(AuthorizedFileFetcher::new(storage.clone(), verifier));
        let process_store = Arc::new(ProcessStore::new());

        let executor = Arc::new(CompositeExecutor::new(
            process_store.clone(),
            storage.clone(),
            event_bus.clone(),
            tool_source.clone(),
            file_fetcher.clone(),
        ));
        let launcher = Arc::new(ProcessLauncher::new(process_store.clone(), storage.clone(), event_bus.clone(), tool_source.clone()));
        let completion = Arc::new(CompletionHandler::new(process_store.clone(), executor.clone()));
        let reconciler = Arc::new(Reconciler::new(process_store.clone(), executor.clone()));

        Self {
            process_store,
            storage,
            event_bus,
            tool_source,
            launcher,
            executor,
            completion,
            reconciler,
            file_fetcher,
            _dir: dir,
        }
    }

    /// Registers a leaf tool definition at a storage path, for
    /// `tool_definition_path` instructions to resolve against.
    pub async fn put_tool(&self, path: &str, def: &ToolDefinition) {
        put_json(self.storage.as_ref(), path, def).await.unwrap();
    }
}

pub fn echo_leaf() -> ToolDefinition {
    ToolDefinition {
        description: "echoes its msg argument back as reply".to_string(),
        arguments: vec![ArgumentSpec { name: "msg".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        responses: vec![ArgumentSpec { name: "reply".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        system_event_endpoint: Some("demo::echo".to_string()),
        instructions: None,
        response_reference_map: None,
    }
}

/// A leaf that always fails, for the short-circuit scenario.
pub fn boom_leaf() -> ToolDefinition {
    ToolDefinition {
        description: "always fails".to_string(),
        arguments: vec![ArgumentSpec { name: "msg".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        responses: vec![ArgumentSpec { name: "reply".to_string(), type_name: "string".to_string(), required: true, description: String::new() }],
        system_event_endpoint: Some("demo::boom".to_string()),
        instructions: None,
        response_reference_map: None,
    }
}
