// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component D: the content-addressed versioned filesystem the core treats
//! as an external collaborator (SPEC_FULL.md §1). Only the contract surface
//! the core actually calls is modeled: put/get/describe/list/delete of
//! files, a `file_type` tag per file, and emission of `ratio::file_event`
//! on every mutation (consumed by the Scheduler, Component L).
//!
//! [`LocalFsStorage`] is the reference implementation: a real directory
//! tree on disk, with versions kept as numbered sibling files
//! (`name.v1`, `name.v2`, …) and the tip written to the bare path so
//! ordinary reads don't need to know the version scheme.

use crate::error::AdapterError;
use crate::event_bus::EventBus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Metadata the core reads back from `describe`/`list`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FileDescriptor {
    pub path: String,
    pub file_type: Option<String>,
    pub version: u32,
    pub size_bytes: u64,
    pub modified_on: DateTime<Utc>,
}

/// The storage contract. All paths are absolute, `/`-separated, and
/// independent of the local OS path representation.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8], file_type: Option<&str>) -> Result<FileDescriptor, AdapterError>;
    async fn get(&self, path: &str) -> Result<Vec<u8>, AdapterError>;
    async fn describe(&self, path: &str) -> Result<FileDescriptor, AdapterError>;
    async fn list(&self, directory: &str) -> Result<Vec<FileDescriptor>, AdapterError>;
    async fn delete(&self, path: &str) -> Result<(), AdapterError>;
}

/// Serialize `value` as JSON and `put` it. A free function (not a trait
/// method) so it stays callable through `&dyn Storage` — generic methods
/// cannot appear in a trait's object-safe vtable.
pub async fn put_json<T: Serialize + Sync>(
    storage: &dyn Storage,
    path: &str,
    value: &T,
) -> Result<FileDescriptor, AdapterError> {
    let bytes = serde_json::to_vec(value)?;
    storage.put(path, &bytes, Some("ratio::tool_io")).await
}

/// `get` and deserialize as JSON.
pub async fn get_json<T: DeserializeOwned>(storage: &dyn Storage, path: &str) -> Result<T, AdapterError> {
    let bytes = storage.get(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn to_os_path(root: &Path, logical: &str) -> PathBuf {
    root.join(logical.trim_start_matches('/'))
}

fn file_event_type_created_or_modified(existed: bool) -> &'static str {
    if existed { "modified" } else { "created" }
}

/// Disk-backed [`Storage`]. Every mutation publishes `ratio::file_event`
/// on `bus` so the Scheduler (L) can match subscriptions against real
/// writes, exactly as SPEC_FULL.md §2 describes storage's side effect.
pub struct LocalFsStorage {
    root: PathBuf,
    bus: Arc<dyn EventBus>,
    actor: String,
}

impl LocalFsStorage {
    pub fn new(root: impl Into<PathBuf>, bus: Arc<dyn EventBus>, actor: impl Into<String>) -> Self {
        Self { root: root.into(), bus, actor: actor.into() }
    }

    fn version_path(&self, logical: &str, version: u32) -> PathBuf {
        let base = to_os_path(&self.root, logical);
        let mut os_str = base.into_os_string();
        os_str.push(format!(".v{version}"));
        PathBuf::from(os_str)
    }

    async fn next_version(&self, logical: &str) -> u32 {
        let base = to_os_path(&self.root, logical);
        let Some(parent) = base.parent() else { return 1 };
        let Some(file_name) = base.file_name().and_then(|n| n.to_str()) else { return 1 };
        let prefix = format!("{file_name}.v");
        let mut max_seen = 0u32;
        if let Ok(mut entries) = tokio::fs::read_dir(parent).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if let Some(name) = entry.file_name().to_str() {
                    if let Some(suffix) = name.strip_prefix(&prefix) {
                        if let Ok(v) = suffix.parse::<u32>() {
                            max_seen = max_seen.max(v);
                        }
                    }
                }
            }
        }
        max_seen + 1
    }

    async fn emit_event(&self, path: &str, file_event_type: &str, file_type: Option<&str>) {
        let payload = serde_json::json!({
            "file_path": path,
            "file_event_type": file_event_type,
            "file_type": file_type,
            "actor": self.actor,
        });
        if let Err(err) = self.bus.publish("ratio::file_event", payload).await {
            tracing::warn!(?err, path, "storage: failed to publish file_event");
        }
    }
}

#[async_trait]
impl Storage for LocalFsStorage {
    async fn put(&self, path: &str, bytes: &[u8], file_type: Option<&str>) -> Result<FileDescriptor, AdapterError> {
        let os_path = to_os_path(&self.root, path);
        if let Some(parent) = os_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let existed = tokio::fs::metadata(&os_path).await.is_ok();
        let version = self.next_version(path).await;
        tokio::fs::write(self.version_path(path, version), bytes).await?;
        tokio::fs::write(&os_path, bytes).await?;

        let meta = tokio::fs::metadata(&os_path).await?;
        let descriptor = FileDescriptor {
            path: path.to_string(),
            file_type: file_type.map(str::to_string),
            version,
            size_bytes: meta.len(),
            modified_on: Utc::now(),
        };
        self.emit_event(path, file_event_type_created_or_modified(existed), file_type).await;
        Ok(descriptor)
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, AdapterError> {
        let os_path = to_os_path(&self.root, path);
        tokio::fs::read(&os_path).await.map_err(|_| AdapterError::NotFound(path.to_string()))
    }

    async fn describe(&self, path: &str) -> Result<FileDescriptor, AdapterError> {
        let os_path = to_os_path(&self.root, path);
        let meta = tokio::fs::metadata(&os_path).await.map_err(|_| AdapterError::NotFound(path.to_string()))?;
        let version = self.next_version(path).await.saturating_sub(1).max(1);
        Ok(FileDescriptor {
            path: path.to_string(),
            file_type: None,
            version,
            size_bytes: meta.len(),
            modified_on: meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(Utc::now),
        })
    }

    async fn list(&self, directory: &str) -> Result<Vec<FileDescriptor>, AdapterError> {
        let os_dir = to_os_path(&self.root, directory);
        let mut out = Vec::new();
        let mut entries = tokio::fs::read_dir(&os_dir).await.map_err(|_| AdapterError::NotFound(directory.to_string()))?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.contains(".v") && name_str.rsplit(".v").next().is_some_and(|s| s.parse::<u32>().is_ok()) {
                continue;
            }
            let logical = format!("{}/{}", directory.trim_end_matches('/'), name_str);
            if let Ok(descriptor) = self.describe(&logical).await {
                out.push(descriptor);
            }
        }
        Ok(out)
    }

    async fn delete(&self, path: &str) -> Result<(), AdapterError> {
        let os_path = to_os_path(&self.root, path);
        tokio::fs::remove_file(&os_path).await.map_err(|_| AdapterError::NotFound(path.to_string()))?;
        self.emit_event(path, "deleted", None).await;
        Ok(())
    }
}
