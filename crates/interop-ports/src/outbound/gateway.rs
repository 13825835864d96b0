//! `OutboundGateway`: delivers already-addressed response/event envelopes
//! to a proxy's transport channel. Domain components (channel engine,
//! intent engine, event registry, heartbeat monitor) resolve an
//! `InstanceId` to a `ChannelId` themselves (via the connection registry)
//! and then call this port — it is a thin wrapper over `Transport::publish`
//! that also owns envelope serialization, kept separate from `Transport`
//! so domain code never imports `serde_json` directly for this purpose.

use async_trait::async_trait;
use interop_protocol::{EventEnvelope, ResponseEnvelope};
use interop_types::ChannelId;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OutboundGateway: Send + Sync {
    async fn send_response(&self, channel_id: ChannelId, response: ResponseEnvelope);
    async fn send_event(&self, channel_id: ChannelId, event: EventEnvelope);
}
