//! `Transport` (§4.A): the per-proxy bidirectional envelope channel the
//! root coordinator is built against. Implemented by the WebSocket adapter
//! in production and by an in-memory channel pair in tests.

use async_trait::async_trait;
use interop_types::ChannelId;
use serde_json::Value;
use std::sync::Arc;

/// Registered once by the root dispatcher; invoked for every inbound frame
/// on any proxy's channel (§4.A "subscribe(fn)").
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn handle_inbound(&self, channel_id: ChannelId, payload: Value);

    /// Called when a proxy's channel is torn down by the transport itself
    /// (socket closed by the peer), as opposed to the root-initiated
    /// `Transport::close` (heartbeat timeout, explicit disconnect). Lets
    /// the dispatcher run the same cleanup either way.
    async fn handle_closed(&self, channel_id: ChannelId);
}

/// Per-proxy bidirectional byte-safe envelope channel (§4.A).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `payload` to every proxy mapped to every listed channel;
    /// unknown channel ids are skipped silently (logged at warn by the
    /// implementation).
    async fn publish(&self, channel_ids: Vec<ChannelId>, payload: Value);

    /// Tear down a proxy's channel from the root side (heartbeat timeout,
    /// handshake rejection, explicit disconnect).
    async fn close(&self, channel_id: ChannelId);

    /// Register the single handler that receives every inbound frame and
    /// closed-channel notification across all proxies.
    fn subscribe(&self, handler: Arc<dyn InboundHandler>);
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("channel {0} is not registered with this transport")]
    UnknownChannel(ChannelId),
}
