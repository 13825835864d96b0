//! The reference `Transport` (§4.A): one WebSocket connection per proxy,
//! multiplexed by the root under a `ChannelId` minted at connect time.
//! Mirrors the teacher codebase's player-facing WebSocket handler: an
//! upgrade route, a per-connection send task fed by a bounded `mpsc`
//! channel for backpressure, and a read loop that hands decoded frames to
//! a single shared dispatcher.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use interop_ports::{InboundHandler, Transport};
use interop_types::ChannelId;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;

/// Per-connection outbound buffer size; backpressures a slow proxy rather
/// than growing memory unboundedly (teacher's `CONNECTION_CHANNEL_BUFFER`).
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// The production `Transport`: a map of live `ChannelId`s to each
/// connection's outbound sender, plus the single `InboundHandler` every
/// decoded frame is delivered to.
pub struct WebSocketTransport {
    connections: DashMap<ChannelId, mpsc::Sender<Message>>,
    handler: OnceLock<Arc<dyn InboundHandler>>,
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            handler: OnceLock::new(),
        }
    }

    fn handler(&self) -> Option<Arc<dyn InboundHandler>> {
        self.handler.get().cloned()
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn publish(&self, channel_ids: Vec<ChannelId>, payload: Value) {
        let text = match serde_json::to_string(&payload) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize outbound envelope");
                return;
            }
        };
        for channel_id in channel_ids {
            let Some(sender) = self.connections.get(&channel_id).map(|entry| entry.clone()) else {
                tracing::warn!(channel_id = %channel_id, "publish targeted an unknown channel, skipping");
                continue;
            };
            if sender.send(Message::Text(text.clone().into())).await.is_err() {
                tracing::warn!(channel_id = %channel_id, "publish failed, connection already closed");
            }
        }
    }

    async fn close(&self, channel_id: ChannelId) {
        if let Some((_, sender)) = self.connections.remove(&channel_id) {
            let _ = sender.send(Message::Close(None)).await;
        }
    }

    fn subscribe(&self, handler: Arc<dyn InboundHandler>) {
        // Only ever called once, by the composition layer before `serve`
        // starts accepting connections.
        let _ = self.handler.set(handler);
    }
}

/// The `/ws` upgrade route. Mount with [`router`].
async fn ws_handler(ws: WebSocketUpgrade, State(transport): State<Arc<WebSocketTransport>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, transport))
}

async fn handle_socket(socket: WebSocket, transport: Arc<WebSocketTransport>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let channel_id = ChannelId::new(uuid::Uuid::new_v4().to_string());

    let (tx, mut rx) = mpsc::channel::<Message>(CONNECTION_CHANNEL_BUFFER);
    transport.connections.insert(channel_id.clone(), tx);

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if ws_sender.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => {
                    if let Some(handler) = transport.handler() {
                        handler.handle_inbound(channel_id.clone(), value).await;
                    }
                }
                Err(err) => {
                    tracing::warn!(channel_id = %channel_id, error = %err, "dropping unparseable frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Binary(_)) => {}
            Err(err) => {
                tracing::warn!(channel_id = %channel_id, error = %err, "websocket read error, closing connection");
                break;
            }
        }
    }

    transport.connections.remove(&channel_id);
    send_task.abort();

    if let Some(handler) = transport.handler() {
        handler.handle_closed(channel_id).await;
    }
}

/// The root's sole HTTP surface: the WebSocket upgrade endpoint every
/// proxy connects to (§4.A).
pub fn router(transport: Arc<WebSocketTransport>) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(transport)
}
