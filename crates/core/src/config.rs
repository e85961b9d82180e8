// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global installation settings.
//!
//! The source organizes these as a singleton configuration table. We model
//! it as an explicit record, loaded once at process start and handed down
//! through `Arc<RwLock<GlobalSettings>>` (or similar) by the caller; values
//! an admin mutates at runtime are re-read on a cadence rather than fetched
//! fresh on every access (see design note in SPEC_FULL.md §9).

use serde::{Deserialize, Serialize};

/// Installation-wide configuration, persisted in a single-row settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub installation_initialized: bool,
    pub admin_entity_id: String,
    pub admin_group_id: String,
    pub token_active_hours: u32,
    pub global_process_timeout_minutes: u32,
    pub enforce_recursion_detection: bool,
    pub recursion_detection_threshold: u32,
    pub default_global_working_dir: String,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            installation_initialized: false,
            admin_entity_id: String::new(),
            admin_group_id: String::new(),
            token_active_hours: 12,
            global_process_timeout_minutes: 15,
            enforce_recursion_detection: true,
            recursion_detection_threshold: 300,
            default_global_working_dir: "/".to_string(),
        }
    }
}

impl GlobalSettings {
    /// How often a running handler should re-read settings from the store.
    pub const RELOAD_CADENCE_SECS: u64 = 60;
}
