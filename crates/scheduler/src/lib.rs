// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! The Scheduler / Subscription Engine (Component L, SPEC_FULL.md §4.8):
//! matches incoming filesystem and general events against stored
//! subscriptions and launches a new root execution for each match,
//! subject to the filter-condition language, recursion detection, and a
//! tool-definition readability check.

mod error;
mod path;

pub use error::SchedulerError;

use chrono::{DateTime, Utc};
use ratio_adapters::{EventBus, Storage};
use ratio_core::{evaluate_condition, GlobalSettings, SubscriptionCommon};
use ratio_engine::{ProcessLauncher, ToolDefinitionRef, ToolIo};
use ratio_store::{full_path_hash, SubscriptionStore};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Summary of one matching pass, for logging and tests.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatchReport {
    pub launched: Vec<ratio_core::ProcessId>,
    pub recursion_blocked: usize,
    pub permission_denied: usize,
    pub filtered_out: usize,
}

pub struct Scheduler {
    subscription_store: Arc<SubscriptionStore>,
    launcher: Arc<ProcessLauncher>,
    storage: Arc<dyn Storage>,
}

impl Scheduler {
    pub fn new(subscription_store: Arc<SubscriptionStore>, launcher: Arc<ProcessLauncher>, storage: Arc<dyn Storage>) -> Self {
        Self { subscription_store, launcher, storage }
    }

    /// Handle one `ratio::file_event` payload (SPEC_FULL.md §4.8, the
    /// filesystem consumer).
    pub async fn handle_file_event(
        &self,
        file_path: &str,
        file_event_type: &str,
        file_type: Option<&str>,
        actor: &str,
        settings: &GlobalSettings,
        now: DateTime<Utc>,
    ) -> MatchReport {
        let (parent_path, file_name) = path::split_parent_and_name(file_path);
        let hash = full_path_hash(parent_path, file_name);
        let payload = serde_json::json!({
            "file_path": file_path,
            "file_event_type": file_event_type,
            "file_type": file_type,
            "actor": actor,
        });

        let mut report = MatchReport::default();
        for sub in self.subscription_store.filesystem_candidates(&hash) {
            if !sub.common.is_eligible(now) {
                continue;
            }
            if let Some(expected) = &sub.file_event_type {
                if expected != file_event_type {
                    report.filtered_out += 1;
                    continue;
                }
            }
            if let Some(expected) = &sub.file_type {
                if Some(expected.as_str()) != file_type {
                    report.filtered_out += 1;
                    continue;
                }
            }
            if !passes_filter_conditions(&sub.common, &payload) {
                report.filtered_out += 1;
                continue;
            }
            if settings.enforce_recursion_detection && is_recursive(&sub.common, settings, now) {
                report.recursion_blocked += 1;
                continue;
            }

            match self.launch(&sub.common, &payload, now).await {
                Ok(process_id) => {
                    let _ = self.subscription_store.mark_fired_filesystem(&sub.common.subscription_id, now);
                    report.launched.push(process_id);
                }
                Err(err) => {
                    warn!(subscription_id = %sub.common.subscription_id, ?err, "scheduler: dropped filesystem trigger");
                    report.permission_denied += 1;
                }
            }
        }
        report
    }

    /// Handle one `ratio::system_event` payload (SPEC_FULL.md §4.8, the
    /// general consumer) — same match/launch loop, partitioned by
    /// `event_type` instead of a path hash.
    pub async fn handle_system_event(
        &self,
        event_type: &str,
        payload: &Value,
        settings: &GlobalSettings,
        now: DateTime<Utc>,
    ) -> MatchReport {
        let mut report = MatchReport::default();
        for sub in self.subscription_store.general_candidates(event_type) {
            if !sub.common.is_eligible(now) {
                continue;
            }
            if !passes_filter_conditions(&sub.common, payload) {
                report.filtered_out += 1;
                continue;
            }
            if settings.enforce_recursion_detection && is_recursive(&sub.common, settings, now) {
                report.recursion_blocked += 1;
                continue;
            }

            match self.launch(&sub.common, payload, now).await {
                Ok(process_id) => {
                    let _ = self.subscription_store.mark_fired_general(&sub.common.subscription_id, now);
                    report.launched.push(process_id);
                }
                Err(err) => {
                    warn!(subscription_id = %sub.common.subscription_id, ?err, "scheduler: dropped general trigger");
                    report.permission_denied += 1;
                }
            }
        }
        report
    }

    /// Launch the subscription's tool as the subscription's owner, with
    /// `arguments={event_details}` (SPEC_FULL.md §4.8). The tool file must
    /// be readable by the owner at trigger time; unreadable drops the
    /// trigger rather than erroring the whole pass.
    async fn launch(
        &self,
        common: &SubscriptionCommon,
        event_payload: &Value,
        now: DateTime<Utc>,
    ) -> Result<ratio_core::ProcessId, SchedulerError> {
        self.storage.describe(&common.tool_definition).await.map_err(ratio_engine::EngineError::from)?;

        let arguments = event_payload_to_tool_io(event_payload);
        let process_id = self
            .launcher
            .execute(
                ToolDefinitionRef::Path(common.tool_definition.clone()),
                arguments,
                common.process_owner.clone(),
                common.execution_working_directory.clone(),
                None,
                None,
                now,
            )
            .await?;
        Ok(process_id)
    }
}

fn event_payload_to_tool_io(payload: &Value) -> ToolIo {
    match ratio_engine::convert::json_literal_to_typed(payload) {
        ratio_core::TypedValue::Object(map) => map,
        _ => ToolIo::new(),
    }
}

/// A subscription's `last_execution` within the global recursion window
/// blocks a new launch (SPEC_FULL.md §4.8 / §8 invariant 5).
fn is_recursive(common: &SubscriptionCommon, settings: &GlobalSettings, now: DateTime<Utc>) -> bool {
    let Some(last) = common.last_execution else { return false };
    let elapsed = (now - last).num_seconds();
    elapsed < settings.recursion_detection_threshold as i64
}

/// `filter_conditions` is opaque to the store and evaluated here against
/// the incoming event payload bound as `arguments` (SPEC_FULL.md §4.8).
/// `evaluate_condition` only ever calls `lookup` with a condition's
/// `param` when it starts with `"REF:"` — a bare literal `param` never
/// reaches this closure.
fn passes_filter_conditions(common: &SubscriptionCommon, payload: &Value) -> bool {
    let Some(conditions) = &common.filter_conditions else { return true };
    let lookup = |reference: &str| resolve_arguments_reference(payload, reference);
    evaluate_condition(conditions, &lookup)
}

/// Resolve a `REF:arguments.<key>` condition `param` against the event
/// payload; any other reference shape is unresolvable here.
fn resolve_arguments_reference(payload: &Value, reference: &str) -> Option<Value> {
    let key = reference.strip_prefix("REF:arguments.")?;
    payload.as_object().and_then(|m| m.get(key)).cloned()
}

/// Background loop: subscribe to `ratio::file_event` on `bus` and run
/// every delivery through [`Scheduler::handle_file_event`]. Runs until
/// the bus drops its sender side.
pub async fn run_file_event_loop(
    scheduler: Arc<Scheduler>,
    bus: Arc<dyn EventBus>,
    settings: Arc<parking_lot::RwLock<GlobalSettings>>,
) {
    let mut rx = bus.subscribe("ratio::file_event");
    while let Some(payload) = rx.recv().await {
        let (Some(file_path), Some(file_event_type), Some(actor)) = (
            payload.get("file_path").and_then(Value::as_str),
            payload.get("file_event_type").and_then(Value::as_str),
            payload.get("actor").and_then(Value::as_str),
        ) else {
            warn!(?payload, "scheduler: malformed file_event payload, dropping");
            continue;
        };
        let file_type = payload.get("file_type").and_then(Value::as_str);
        let settings_snapshot = settings.read().clone();
        scheduler.handle_file_event(file_path, file_event_type, file_type, actor, &settings_snapshot, Utc::now()).await;
    }
}

/// Background loop: subscribe to `ratio::system_event` on `bus` and run
/// every delivery through [`Scheduler::handle_system_event`].
pub async fn run_system_event_loop(
    scheduler: Arc<Scheduler>,
    bus: Arc<dyn EventBus>,
    settings: Arc<parking_lot::RwLock<GlobalSettings>>,
) {
    let mut rx = bus.subscribe("ratio::system_event");
    while let Some(payload) = rx.recv().await {
        let Some(event_type) = payload.get("event_type").and_then(Value::as_str).map(str::to_string) else {
            warn!(?payload, "scheduler: malformed system_event payload, dropping");
            continue;
        };
        let inner = payload.get("payload").cloned().unwrap_or(Value::Null);
        let settings_snapshot = settings.read().clone();
        scheduler.handle_system_event(&event_type, &inner, &settings_snapshot, Utc::now()).await;
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
