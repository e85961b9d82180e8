// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory Subscription Store (Component B): owns both subscription
//! flavors and the secondary indices the Scheduler (L) needs to find
//! candidates for an incoming event in O(matches) rather than a full scan.

use crate::StoreError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use ratio_core::{FilesystemSubscription, GeneralSubscription, SubscriptionId};
use std::collections::HashMap;

#[derive(Default)]
pub struct SubscriptionStore {
    filesystem: RwLock<HashMap<SubscriptionId, FilesystemSubscription>>,
    general: RwLock<HashMap<SubscriptionId, GeneralSubscription>>,
    by_path_hash: RwLock<HashMap<String, Vec<SubscriptionId>>>,
    by_event_type: RwLock<HashMap<String, Vec<SubscriptionId>>>,
}

impl SubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_filesystem(&self, sub: FilesystemSubscription) {
        let id = sub.common.subscription_id;
        let hash = sub.full_path_hash.clone();
        self.filesystem.write().insert(id, sub);
        self.by_path_hash.write().entry(hash).or_default().push(id);
    }

    pub fn insert_general(&self, sub: GeneralSubscription) {
        let id = sub.common.subscription_id;
        let event_type = sub.event_type.clone();
        self.general.write().insert(id, sub);
        self.by_event_type.write().entry(event_type).or_default().push(id);
    }

    /// Filesystem subscriptions keyed by `full_path_hash`, regardless of
    /// eligibility — callers filter with [`ratio_core::SubscriptionCommon::is_eligible`].
    pub fn filesystem_candidates(&self, full_path_hash: &str) -> Vec<FilesystemSubscription> {
        let subs = self.filesystem.read();
        self.by_path_hash
            .read()
            .get(full_path_hash)
            .into_iter()
            .flatten()
            .filter_map(|id| subs.get(id).cloned())
            .collect()
    }

    pub fn general_candidates(&self, event_type: &str) -> Vec<GeneralSubscription> {
        let subs = self.general.read();
        self.by_event_type
            .read()
            .get(event_type)
            .into_iter()
            .flatten()
            .filter_map(|id| subs.get(id).cloned())
            .collect()
    }

    /// Record a firing: stamps `last_execution` and, for single-use
    /// subscriptions, removes the subscription from both the primary map
    /// and its secondary index so it is never matched again.
    pub fn mark_fired_filesystem(&self, subscription_id: &SubscriptionId, fired_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut subs = self.filesystem.write();
        let sub = subs
            .get_mut(subscription_id)
            .ok_or_else(|| StoreError::SubscriptionNotFound(subscription_id.to_string()))?;
        sub.common.last_execution = Some(fired_at);
        if sub.common.single_use {
            let hash = sub.full_path_hash.clone();
            subs.remove(subscription_id);
            drop(subs);
            if let Some(ids) = self.by_path_hash.write().get_mut(&hash) {
                ids.retain(|id| id != subscription_id);
            }
        }
        Ok(())
    }

    pub fn mark_fired_general(&self, subscription_id: &SubscriptionId, fired_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut subs = self.general.write();
        let sub = subs
            .get_mut(subscription_id)
            .ok_or_else(|| StoreError::SubscriptionNotFound(subscription_id.to_string()))?;
        sub.common.last_execution = Some(fired_at);
        if sub.common.single_use {
            let event_type = sub.event_type.clone();
            subs.remove(subscription_id);
            drop(subs);
            if let Some(ids) = self.by_event_type.write().get_mut(&event_type) {
                ids.retain(|id| id != subscription_id);
            }
        }
        Ok(())
    }

    pub fn delete_filesystem(&self, subscription_id: &SubscriptionId) -> Option<FilesystemSubscription> {
        let removed = self.filesystem.write().remove(subscription_id)?;
        if let Some(ids) = self.by_path_hash.write().get_mut(&removed.full_path_hash) {
            ids.retain(|id| id != subscription_id);
        }
        Some(removed)
    }

    pub fn delete_general(&self, subscription_id: &SubscriptionId) -> Option<GeneralSubscription> {
        let removed = self.general.write().remove(subscription_id)?;
        if let Some(ids) = self.by_event_type.write().get_mut(&removed.event_type) {
            ids.retain(|id| id != subscription_id);
        }
        Some(removed)
    }

    pub fn get_filesystem(&self, subscription_id: &SubscriptionId) -> Option<FilesystemSubscription> {
        self.filesystem.read().get(subscription_id).cloned()
    }

    pub fn get_general(&self, subscription_id: &SubscriptionId) -> Option<GeneralSubscription> {
        self.general.read().get(subscription_id).cloned()
    }

    pub fn list_filesystem(&self) -> Vec<FilesystemSubscription> {
        self.filesystem.read().values().cloned().collect()
    }

    pub fn list_general(&self) -> Vec<GeneralSubscription> {
        self.general.read().values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "subscription_store_tests.rs"]
mod tests;
