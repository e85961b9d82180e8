// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use parking_lot::RwLock;
use ratio_adapters::{EventBus, Storage, TokenVerifier};
use ratio_core::GlobalSettings;
use ratio_engine::ProcessLauncher;
use ratio_store::{ProcessStore, SubscriptionStore};
use std::sync::Arc;

use crate::ws::ConnectionRegistry;

/// Everything a request handler needs, shared across the gateway's routes
/// and the websocket bridge task (Component H, SPEC_FULL.md §4.5).
pub struct AppState {
    pub process_store: Arc<ProcessStore>,
    pub subscription_store: Arc<SubscriptionStore>,
    pub storage: Arc<dyn Storage>,
    pub event_bus: Arc<dyn EventBus>,
    pub launcher: Arc<ProcessLauncher>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub settings: Arc<RwLock<GlobalSettings>>,
    pub connections: Arc<ConnectionRegistry>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        process_store: Arc<ProcessStore>,
        subscription_store: Arc<SubscriptionStore>,
        storage: Arc<dyn Storage>,
        event_bus: Arc<dyn EventBus>,
        launcher: Arc<ProcessLauncher>,
        verifier: Arc<dyn TokenVerifier>,
        settings: Arc<RwLock<GlobalSettings>>,
    ) -> Self {
        Self {
            process_store,
            subscription_store,
            storage,
            event_bus,
            launcher,
            verifier,
            settings,
            connections: Arc::new(ConnectionRegistry::default()),
        }
    }
}
