//! `InboundHandler` (§4.A, §4.I): the single entry point every transport
//! frame passes through, whichever phase of the connection lifecycle it
//! belongs to.

use crate::root::Root;
use async_trait::async_trait;
use interop_ports::InboundHandler;
use interop_protocol::{RequestEnvelope, ResponseEnvelope, ResponseMeta, Wcp1Hello, Wcp4ValidateAppIdentity};
use interop_types::ChannelId;
use serde_json::Value;

#[async_trait]
impl InboundHandler for Root {
    async fn handle_inbound(&self, channel_id: ChannelId, payload: Value) {
        let Some(identifier) = self.connections.identifier_for(&channel_id) else {
            self.handle_handshake_frame(channel_id, payload).await;
            return;
        };

        let envelope: RequestEnvelope = match serde_json::from_value(payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(channel_id = %channel_id, error = %err, "dropping malformed request frame");
                return;
            }
        };

        if self.heartbeats.get(&identifier).is_none() {
            self.spawn_heartbeat_loop(identifier.clone());
        }

        let request_uuid = envelope.meta.request_uuid.clone();
        if let Some(response_payload) = self.route(identifier, request_uuid.clone(), envelope.payload).await {
            let meta = ResponseMeta::reply_to(request_uuid, Root::identity(), self.clock.now_rfc3339());
            self.gateway.send_response(channel_id, ResponseEnvelope { payload: response_payload, meta }).await;
        }
    }

    async fn handle_closed(&self, channel_id: ChannelId) {
        self.pending_hello.remove(&channel_id);
        if let Some(identifier) = self.connections.identifier_for(&channel_id) {
            self.disconnect(&identifier, false).await;
        }
    }
}

impl Root {
    /// Pre-identity frames (§4.A steps 1 and 3): whichever of `WCP1Hello`
    /// or `WCP4ValidateAppIdentity` is expected next, keyed off whether
    /// this channel already sent its hello.
    async fn handle_handshake_frame(&self, channel_id: ChannelId, payload: Value) {
        if !self.pending_hello.contains_key(&channel_id) {
            match serde_json::from_value::<Wcp1Hello>(payload) {
                Ok(hello) => {
                    let response = self.handle_hello(channel_id.clone(), hello);
                    self.publish_handshake(channel_id, &response).await;
                }
                Err(err) => {
                    tracing::warn!(channel_id = %channel_id, error = %err, "dropping malformed WCP1Hello frame");
                    self.transport.close(channel_id).await;
                }
            }
            return;
        }

        match serde_json::from_value::<Wcp4ValidateAppIdentity>(payload) {
            Ok(msg) => match self.handle_validate_identity(channel_id.clone(), msg).await {
                Ok(success) => {
                    self.publish_handshake(channel_id.clone(), &success).await;
                    if let Some(identifier) = self.connections.identifier_for(&channel_id) {
                        if self.heartbeats.get(&identifier).is_none() {
                            self.spawn_heartbeat_loop(identifier);
                        }
                    }
                }
                Err(failure) => {
                    self.publish_handshake(channel_id.clone(), &failure).await;
                    self.pending_hello.remove(&channel_id);
                    self.transport.close(channel_id).await;
                }
            },
            Err(err) => {
                tracing::warn!(channel_id = %channel_id, error = %err, "dropping malformed WCP4ValidateAppIdentity frame");
                self.pending_hello.remove(&channel_id);
                self.transport.close(channel_id).await;
            }
        }
    }

    async fn publish_handshake<T: serde::Serialize>(&self, channel_id: ChannelId, message: &T) {
        match serde_json::to_value(message) {
            Ok(json) => self.transport.publish(vec![channel_id], json).await,
            Err(err) => tracing::error!(error = %err, "handshake message failed to serialize"),
        }
    }
}
