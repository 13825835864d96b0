//! `OutboundGateway`: the thin envelope-serialization wrapper over
//! `Transport::publish` domain code calls instead of touching
//! `serde_json` directly.

use async_trait::async_trait;
use interop_ports::{OutboundGateway, Transport};
use interop_protocol::{EventEnvelope, ResponseEnvelope};
use interop_types::ChannelId;
use std::sync::Arc;

pub struct WebSocketGateway {
    transport: Arc<dyn Transport>,
}

impl WebSocketGateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl OutboundGateway for WebSocketGateway {
    async fn send_response(&self, channel_id: ChannelId, response: ResponseEnvelope) {
        match serde_json::to_value(&response) {
            Ok(value) => self.transport.publish(vec![channel_id], value).await,
            Err(err) => tracing::error!(error = %err, "response envelope failed to serialize"),
        }
    }

    async fn send_event(&self, channel_id: ChannelId, event: EventEnvelope) {
        match serde_json::to_value(&event) {
            Ok(value) => self.transport.publish(vec![channel_id], value).await,
            Err(err) => tracing::error!(error = %err, "event envelope failed to serialize"),
        }
    }
}
