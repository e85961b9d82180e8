// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single websocket endpoint (SPEC_FULL.md §4.5/§6): one connection
//! per caller token, streaming a frame whenever a process carrying that
//! connection id reaches a `ratio::tool_response` event — `final_response`
//! is true exactly when the process that just terminated is a root.

use crate::auth::AuthContext;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use nanoid::nanoid;
use parking_lot::RwLock;
use ratio_core::ids::SYSTEM_PARENT;
use ratio_core::ProcessId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// A frame pushed to a connected client (spec.md §6 WebSocket section).
#[derive(Debug, Clone, Serialize)]
pub struct ProcessFrame {
    pub process_id: String,
    pub parent_process_id: String,
    pub final_response: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    senders: RwLock<HashMap<String, mpsc::UnboundedSender<ProcessFrame>>>,
}

impl ConnectionRegistry {
    pub fn register(&self, connection_id: String) -> mpsc::UnboundedReceiver<ProcessFrame> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.write().insert(connection_id, tx);
        rx
    }

    pub fn unregister(&self, connection_id: &str) {
        self.senders.write().remove(connection_id);
    }

    pub fn send(&self, connection_id: &str, frame: ProcessFrame) {
        if let Some(sender) = self.senders.read().get(connection_id) {
            let _ = sender.send(frame);
        }
    }
}

pub async fn ws_handler(State(state): State<Arc<AppState>>, auth: AuthContext, ws: WebSocketUpgrade) -> impl IntoResponse {
    let connection_id = format!("ws-{}-{}", auth.claims.sub, nanoid!(12));
    ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, connection_id: String) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = state.connections.register(connection_id.clone());

    let forward = async {
        while let Some(frame) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&frame) else { continue };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    };

    let drain_inbound = async {
        while let Some(Ok(_)) = stream.next().await {
            // Clients don't send anything meaningful; keep the socket alive.
        }
    };

    tokio::select! {
        _ = forward => {},
        _ = drain_inbound => {},
    }

    state.connections.unregister(&connection_id);
}

/// Background task: subscribe to `ratio::tool_response` and stream a
/// frame to whichever connection the just-terminated process carries, if
/// any (SPEC_FULL.md §4.5). Runs until the bus closes.
pub async fn run_websocket_bridge(state: Arc<AppState>) {
    let mut rx = state.event_bus.subscribe("ratio::tool_response");
    while let Some(payload) = rx.recv().await {
        let Some(process_id) = payload.get("process_id").and_then(|v| v.as_str()) else {
            warn!(?payload, "gateway: malformed tool_response payload, dropping");
            continue;
        };
        let process_id = ProcessId::from_string(process_id);
        let Some(process) = state.process_store.get(&process_id) else { continue };
        let Some(connection_id) = &process.websocket_connection_id else { continue };

        let failure = payload.get("failure").and_then(|v| v.as_str()).map(str::to_string);
        let response = payload.get("response").and_then(|v| v.as_str()).map(str::to_string);
        let frame = ProcessFrame {
            process_id: process.process_id.to_string(),
            parent_process_id: process.parent_process_id.clone(),
            final_response: process.parent_process_id == SYSTEM_PARENT,
            response,
            failure,
        };
        state.connections.send(connection_id, frame);
    }
}
