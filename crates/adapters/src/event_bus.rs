// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component C: at-least-once delivery of typed events to named topics.
//!
//! The core treats the bus as an opaque collaborator (SPEC_FULL.md §1/§6):
//! publish a JSON payload on a topic, subscribe to receive every payload
//! published after subscription. [`InMemoryEventBus`] is the reference
//! implementation used by the daemon binary and every crate's test suite —
//! a single process here plays the role a real broker (Kafka/SQS/etc.)
//! would play in a multi-node deployment.

use crate::error::AdapterError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// A named-topic publish/subscribe bus.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish `payload` on `topic`. Delivered to every current
    /// subscriber of that topic; a topic with no subscribers still
    /// succeeds (nothing to deliver to, same as a real broker with no
    /// live consumer group).
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), AdapterError>;

    /// Register a new subscriber for `topic`. Only events published
    /// *after* this call are observed by the returned receiver.
    fn subscribe(&self, topic: &str) -> mpsc::Receiver<serde_json::Value>;
}

const SUBSCRIBER_CHANNEL_CAPACITY: usize = 1024;

/// In-process fan-out bus: one `Vec<Sender>` per topic, guarded by a
/// `parking_lot::Mutex`. Publish clones the payload to every live sender;
/// a send failing because a receiver was dropped is logged and otherwise
/// ignored (no redelivery — matches the "opaque, at-least-once" contract
/// without needing a persistent backing queue for this reference build).
#[derive(Default)]
pub struct InMemoryEventBus {
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<serde_json::Value>>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), AdapterError> {
        let senders = {
            let mut guard = self.subscribers.lock();
            let senders = guard.entry(topic.to_string()).or_default();
            senders.retain(|s| !s.is_closed());
            senders.clone()
        };
        for sender in senders {
            if sender.send(payload.clone()).await.is_err() {
                tracing::debug!(topic, "event_bus: subscriber channel closed mid-send");
            }
        }
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> mpsc::Receiver<serde_json::Value> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        self.subscribers.lock().entry(topic.to_string()).or_default().push(tx);
        rx
    }
}
