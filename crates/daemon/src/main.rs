// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ratiod` — the process-engine daemon binary: wires Components A-L
//! together and serves the Process Manager API (H) over HTTP/WS while the
//! Scheduler (L), Composite Executor (I)/Completion Handler (J), and
//! Reconciler (K) run as background tasks feeding one dispatch loop
//! (SPEC_FULL.md §5).
//!
//! The declarative infrastructure-provisioning layer, the leaf-tool
//! implementations, and the command-line front-end are external
//! collaborators (spec.md §1) and are not part of this binary.

mod config;
mod dispatch;
mod env;

use clap::Parser;
use parking_lot::RwLock;
use ratio_adapters::{AuthorizedFileFetcher, FilesystemWatcher, InMemoryEventBus, JwtAuth, LocalFsStorage, Storage, TokenVerifier};
use ratio_core::GlobalSettings;
use ratio_engine::{CompletionHandler, CompositeExecutor, ProcessLauncher, Reconciler, StorageToolSource};
use ratio_gateway::AppState;
use ratio_scheduler::Scheduler;
use ratio_store::{ProcessStore, Snapshot, SubscriptionStore};
use std::sync::Arc;
use tokio::time::interval;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "ratiod", about = "Distributed tool-execution and orchestration daemon")]
struct Cli {
    /// HTTP/WS bind address, overrides RATIO_BIND_ADDR.
    #[arg(long)]
    bind: Option<String>,

    /// Path to the TOML settings file, overrides RATIO_CONFIG.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Root directory for the local storage backend and state snapshots,
    /// overrides RATIO_STATE_DIR.
    #[arg(long)]
    state_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("RATIO_RSA_PRIVATE_KEY and RATIO_RSA_PUBLIC_KEY must both be set to RS256 PEM key paths")]
    MissingKeys,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Auth(#[from] ratio_adapters::AuthError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Store(#[from] ratio_store::StoreError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).json().init();

    if let Err(err) = run().await {
        error!(%err, "ratiod: startup failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let cli = Cli::parse();
    let state_dir = cli.state_dir.unwrap_or_else(env::state_dir);
    let config_path = cli.config.unwrap_or_else(env::config_path);
    let bind_addr = cli.bind.unwrap_or_else(env::bind_addr);

    let settings = config::load(&config_path)?;
    info!(?config_path, ?state_dir, "ratiod: loaded settings");
    let settings = Arc::new(RwLock::new(settings));

    let (private_pem, public_pem) = match (env::rsa_private_key_path(), env::rsa_public_key_path()) {
        (Some(private), Some(public)) => (std::fs::read(private)?, std::fs::read(public)?),
        _ => return Err(StartupError::MissingKeys),
    };
    let auth = Arc::new(JwtAuth::new(&private_pem, &public_pem, env::token_issuer())?);
    let verifier: Arc<dyn TokenVerifier> = auth.clone();

    let event_bus: Arc<dyn ratio_adapters::EventBus> = Arc::new(InMemoryEventBus::new());
    let storage_root = state_dir.join("storage");
    std::fs::create_dir_all(&storage_root)?;
    let storage: Arc<dyn Storage> = Arc::new(LocalFsStorage::new(&storage_root, event_bus.clone(), env::storage_actor()));
    let _watcher = FilesystemWatcher::start(&storage_root, event_bus.clone(), env::storage_actor())
        .inspect_err(|err| warn!(%err, "ratiod: filesystem watcher failed to start, external writes won't trigger subscriptions"))
        .ok();

    let process_store = Arc::new(ProcessStore::new());
    let subscription_store = Arc::new(SubscriptionStore::new());
    let snapshot_path = state_dir.join("snapshot.json");
    if let Ok(snapshot) = Snapshot::load(&snapshot_path) {
        info!(processes = snapshot.processes.len(), "ratiod: restoring snapshot");
        snapshot.restore_into(&process_store, &subscription_store);
    }

    let tool_source = Arc::new(StorageToolSource::new(storage.clone()));
    let file_fetcher = Arc::new(AuthorizedFileFetcher::new(storage.clone(), verifier.clone()));
    let executor = Arc::new(CompositeExecutor::new(
        process_store.clone(),
        storage.clone(),
        event_bus.clone(),
        tool_source.clone(),
        file_fetcher,
    ));
    let launcher = Arc::new(ProcessLauncher::new(process_store.clone(), storage.clone(), event_bus.clone(), tool_source));
    let completion = Arc::new(CompletionHandler::new(process_store.clone(), executor.clone()));
    let reconciler = Arc::new(Reconciler::new(process_store.clone(), executor.clone()));
    let scheduler = Arc::new(Scheduler::new(subscription_store.clone(), launcher.clone(), storage.clone()));

    let dispatcher = Arc::new(dispatch::Dispatcher {
        completion,
        executor,
        reconciler,
        scheduler,
        settings: settings.clone(),
    });
    let rx = dispatch::spawn_forwarders(event_bus.clone(), env::reconcile_interval());
    tokio::spawn(dispatcher.run(rx));

    spawn_snapshot_task(process_store.clone(), subscription_store.clone(), snapshot_path);

    let app_state = Arc::new(AppState::new(process_store, subscription_store, storage, event_bus.clone(), launcher, verifier, settings));
    tokio::spawn(ratio_gateway::ws::run_websocket_bridge(app_state.clone()));

    let router = ratio_gateway::build_router(app_state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "ratiod: listening");
    axum::serve(listener, router).await?;
    Ok(())
}

/// Periodically dump both stores to disk so a restart can recover
/// `RUNNING` processes without relying solely on the reconciler's
/// timeout sweep (SPEC_FULL.md §4.9, "stuck parent" repair starts from
/// whatever state survived the crash).
fn spawn_snapshot_task(process_store: Arc<ProcessStore>, subscription_store: Arc<SubscriptionStore>, path: std::path::PathBuf) {
    tokio::spawn(async move {
        let mut ticker = interval(env::snapshot_interval());
        loop {
            ticker.tick().await;
            let snapshot = Snapshot::capture(&process_store, &subscription_store, chrono::Utc::now());
            if let Err(err) = snapshot.save(&path) {
                warn!(?err, "ratiod: failed to save snapshot");
            }
        }
    });
}
