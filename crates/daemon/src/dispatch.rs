// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's single event loop (SPEC_FULL.md §5): every `ratio::*`
//! topic is forwarded onto one `tokio::sync::mpsc` channel of
//! [`ratio_core::Event`], and one task drains that channel and dispatches
//! each event to the right component in turn. The HTTP server, the
//! filesystem watcher, and the reconciler's timer each run as independent
//! Tokio tasks that only ever *feed* this channel — none of them mutate
//! process/subscription state directly, mirroring the teacher's `Event`
//! channel shape in `RuntimeDeps`/`Executor`.

use chrono::Utc;
use parking_lot::RwLock;
use ratio_core::{Event, GlobalSettings};
use ratio_engine::{CompletionHandler, CompositeExecutor, Reconciler};
use ratio_scheduler::Scheduler;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 4096;

/// Spawns the five topic-forwarder tasks plus the reconcile ticker, all
/// feeding a freshly created channel, and returns the receiving half for
/// [`run`] to drain.
pub fn spawn_forwarders(bus: Arc<dyn ratio_adapters::EventBus>, reconcile_interval: Duration) -> mpsc::Receiver<Event> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    spawn_topic_forwarder(bus.clone(), tx.clone(), "ratio::tool_response", parse_tool_response);
    spawn_topic_forwarder(bus.clone(), tx.clone(), "ratio::execute_composite_tool", parse_execute_composite_tool);
    spawn_topic_forwarder(bus.clone(), tx.clone(), "ratio::parallel_completion_reconciliation", parse_reconciliation);
    spawn_topic_forwarder(bus.clone(), tx.clone(), "ratio::file_event", parse_file_event);
    spawn_topic_forwarder(bus, tx.clone(), "ratio::system_event", parse_system_event);

    tokio::spawn(async move {
        let mut ticker = interval(reconcile_interval);
        ticker.tick().await; // first tick fires immediately; skip it, the timer governs cadence from here
        loop {
            ticker.tick().await;
            if tx.send(Event::ReconcileTick).await.is_err() {
                break;
            }
        }
    });

    rx
}

fn spawn_topic_forwarder(
    bus: Arc<dyn ratio_adapters::EventBus>,
    tx: mpsc::Sender<Event>,
    topic: &'static str,
    parse: fn(&Value) -> Option<Event>,
) {
    tokio::spawn(async move {
        let mut rx = bus.subscribe(topic);
        while let Some(payload) = rx.recv().await {
            match parse(&payload) {
                Some(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                None => warn!(topic, ?payload, "dispatch: malformed payload, dropping"),
            }
        }
    });
}

fn parse_tool_response(payload: &Value) -> Option<Event> {
    serde_json::from_value(payload.clone()).ok().map(Event::ToolResponse)
}

fn parse_execute_composite_tool(payload: &Value) -> Option<Event> {
    let process_id = payload.get("process_id")?.as_str()?;
    Some(Event::ExecuteCompositeTool { process_id: ratio_core::ProcessId::from_string(process_id) })
}

fn parse_reconciliation(payload: &Value) -> Option<Event> {
    let parent_process_id = payload.get("parent_process_id")?.as_str()?.to_string();
    Some(Event::ParallelCompletionReconciliation { parent_process_id })
}

fn parse_file_event(payload: &Value) -> Option<Event> {
    Some(Event::FileEvent {
        file_path: payload.get("file_path")?.as_str()?.to_string(),
        file_event_type: payload.get("file_event_type")?.as_str()?.to_string(),
        file_type: payload.get("file_type").and_then(Value::as_str).map(str::to_string),
        actor: payload.get("actor")?.as_str()?.to_string(),
    })
}

fn parse_system_event(payload: &Value) -> Option<Event> {
    Some(Event::SystemEvent {
        event_type: payload.get("event_type")?.as_str()?.to_string(),
        payload: payload.get("payload").cloned().unwrap_or(Value::Null),
    })
}

/// Everything one dispatch tick needs to route an [`Event`] to its
/// handling component.
pub struct Dispatcher {
    pub completion: Arc<CompletionHandler>,
    pub executor: Arc<CompositeExecutor>,
    pub reconciler: Arc<Reconciler>,
    pub scheduler: Arc<Scheduler>,
    pub settings: Arc<RwLock<GlobalSettings>>,
}

impl Dispatcher {
    /// Drain `rx` until the last sender is dropped (process shutdown).
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<Event>) {
        while let Some(event) = rx.recv().await {
            debug!(summary = %event.log_summary(), "dispatch: handling event");
            let now = Utc::now();
            if let Err(err) = self.handle_one(event, now).await {
                warn!(?err, "dispatch: event handling failed");
            }
        }
    }

    async fn handle_one(&self, event: Event, now: chrono::DateTime<Utc>) -> Result<(), ratio_engine::EngineError> {
        match event {
            Event::ToolResponse(response) => {
                self.completion.handle(response, now).await?;
            }
            Event::ExecuteCompositeTool { process_id } => {
                self.executor.advance(process_id, None, now).await?;
            }
            Event::ParallelCompletionReconciliation { parent_process_id } => {
                let parent_id = ratio_core::ProcessId::from_string(&parent_process_id);
                self.executor.advance(parent_id, None, now).await?;
            }
            Event::FileEvent { file_path, file_event_type, file_type, actor } => {
                let settings = self.settings.read().clone();
                self.scheduler.handle_file_event(&file_path, &file_event_type, file_type.as_deref(), &actor, &settings, now).await;
            }
            Event::SystemEvent { event_type, payload } => {
                let settings = self.settings.read().clone();
                self.scheduler.handle_system_event(&event_type, &payload, &settings, now).await;
            }
            Event::ReconcileTick => {
                let settings = self.settings.read().clone();
                match self.reconciler.reconcile(now, &settings).await {
                    Ok(report) => debug!(?report, "dispatch: reconcile tick complete"),
                    Err(err) => warn!(?err, "dispatch: reconcile tick failed"),
                }
            }
        }
        Ok(())
    }
}
