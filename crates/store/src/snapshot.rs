// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! A snapshot captures the complete contents of the process and
//! subscription stores at a point in time. There is no separate WAL in
//! this crate (unlike the teacher's job-store durability layer): the
//! process engine's records are small and short-lived (processes expire
//! after their TTL, subscriptions are explicit CRUD), so a periodic full
//! dump is the whole durability story. Grounded on
//! `daemon/src/storage/snapshot.rs`'s version/rotation shape.

use crate::{ProcessStore, StoreError, SubscriptionStore};
use chrono::{DateTime, Utc};
use ratio_core::{FilesystemSubscription, GeneralSubscription, Process};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const MAX_BAK_FILES: u32 = 3;

/// A point-in-time dump of both stores' contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub processes: Vec<Process>,
    pub filesystem_subscriptions: Vec<FilesystemSubscription>,
    pub general_subscriptions: Vec<GeneralSubscription>,
}

impl Snapshot {
    pub fn capture(process_store: &ProcessStore, subscription_store: &SubscriptionStore, created_at: DateTime<Utc>) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            created_at,
            processes: process_store.all(),
            filesystem_subscriptions: subscription_store.list_filesystem(),
            general_subscriptions: subscription_store.list_general(),
        }
    }

    pub fn restore_into(&self, process_store: &ProcessStore, subscription_store: &SubscriptionStore) {
        for process in &self.processes {
            process_store.insert(process.clone());
        }
        for sub in &self.filesystem_subscriptions {
            subscription_store.insert_filesystem(sub.clone());
        }
        for sub in &self.general_subscriptions {
            subscription_store.insert_general(sub.clone());
        }
    }

    /// Write this snapshot to `path`, rotating any existing file to a
    /// `.bak` sibling first so a crash mid-write never destroys the last
    /// good snapshot.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if path.exists() {
            let bak = rotate_bak_path(path);
            fs::rename(path, bak)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`. The
/// oldest backup is removed when the limit is reached.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
