// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent triggers: filesystem-keyed and general-event-keyed
//! subscriptions. Shape grounded on
//! `scheduler/tables/filesystem_subscriptions/client.py` in the source.

use crate::ids::SubscriptionId;
use serde::{Deserialize, Serialize};

/// Fields shared by both subscription flavors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionCommon {
    pub subscription_id: SubscriptionId,
    /// Path to the tool definition to execute on a match.
    pub tool_definition: String,
    pub process_owner: String,
    pub expiration: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub single_use: bool,
    pub last_execution: Option<chrono::DateTime<chrono::Utc>>,
    /// Opaque to the store; interpreted by the scheduler's condition
    /// evaluator. `None`/empty evaluates to vacuously true.
    pub filter_conditions: Option<serde_json::Value>,
    pub execution_working_directory: String,
}

impl SubscriptionCommon {
    /// A subscription is eligible iff not expired and, if single-use, not
    /// yet fired (SPEC_FULL.md §3).
    pub fn is_eligible(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        if let Some(expiration) = self.expiration {
            if now >= expiration {
                return false;
            }
        }
        if self.single_use && self.last_execution.is_some() {
            return false;
        }
        true
    }
}

/// A subscription keyed by a hash of `(parent_path, file_name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemSubscription {
    #[serde(flatten)]
    pub common: SubscriptionCommon,
    /// Partition key: `sha256(sha256(parent_path) + "-" + sha256(file_name))`.
    pub full_path_hash: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub file_event_type: Option<String>,
}

/// A subscription keyed by a general (non-filesystem) event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSubscription {
    #[serde(flatten)]
    pub common: SubscriptionCommon,
    pub event_type: String,
}
