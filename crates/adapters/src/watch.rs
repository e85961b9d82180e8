// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A real filesystem watcher, for deployments where tool-managed files
//! live alongside (rather than exclusively behind) the `Storage`
//! abstraction — e.g. externally-written inputs the Scheduler (L) should
//! still react to. Converts `notify` events into `ratio::file_event`
//! publishes, the same topic [`crate::storage::LocalFsStorage`] uses for
//! its own mutations, so the Scheduler never needs to know which path
//! produced an event.

use crate::event_bus::EventBus;
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Watches a directory tree and republishes changes as `ratio::file_event`.
pub struct FilesystemWatcher {
    _watcher: RecommendedWatcher,
}

impl FilesystemWatcher {
    /// Start watching `root` recursively. Events are translated and
    /// published onto `bus` on a background task; the returned value must
    /// be kept alive for the watch to continue (dropping it stops `notify`).
    pub fn start(root: &Path, bus: Arc<dyn EventBus>, actor: impl Into<String> + Send + 'static) -> notify::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<NotifyEvent>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<NotifyEvent>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        tokio::spawn(async move {
            let actor = actor.into();
            while let Some(event) = rx.recv().await {
                let Some(file_event_type) = classify(&event.kind) else { continue };
                for path in event.paths {
                    let payload = serde_json::json!({
                        "file_path": path.to_string_lossy(),
                        "file_event_type": file_event_type,
                        "file_type": serde_json::Value::Null,
                        "actor": actor,
                    });
                    if let Err(err) = bus.publish("ratio::file_event", payload).await {
                        tracing::warn!(?err, "filesystem watcher: failed to publish file_event");
                    }
                }
            }
        });

        Ok(Self { _watcher: watcher })
    }
}

fn classify(kind: &EventKind) -> Option<&'static str> {
    match kind {
        EventKind::Create(_) => Some("created"),
        EventKind::Modify(_) => Some("modified"),
        EventKind::Remove(_) => Some("deleted"),
        _ => None,
    }
}
