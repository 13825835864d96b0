//! Maps each live instance to the `ChannelId` the transport assigned it at
//! connection time (§4.A), and back. Every other domain component resolves
//! "where do I send this instance a message" through here before calling
//! `OutboundGateway`.

use dashmap::DashMap;
use interop_types::{ChannelId, FullyQualifiedAppIdentifier};

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_instance: DashMap<FullyQualifiedAppIdentifier, ChannelId>,
    by_channel: DashMap<ChannelId, FullyQualifiedAppIdentifier>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a freshly validated instance to its transport channel (§4.A
    /// step 4).
    pub fn bind(&self, identifier: FullyQualifiedAppIdentifier, channel_id: ChannelId) {
        self.by_instance.insert(identifier.clone(), channel_id.clone());
        self.by_channel.insert(channel_id, identifier);
    }

    pub fn channel_for(&self, identifier: &FullyQualifiedAppIdentifier) -> Option<ChannelId> {
        self.by_instance.get(identifier).map(|entry| entry.clone())
    }

    pub fn identifier_for(&self, channel_id: &ChannelId) -> Option<FullyQualifiedAppIdentifier> {
        self.by_channel.get(channel_id).map(|entry| entry.clone())
    }

    /// Remove all trace of a disconnected instance (§4.H "Disconnection").
    pub fn remove(&self, identifier: &FullyQualifiedAppIdentifier) {
        if let Some((_, channel_id)) = self.by_instance.remove(identifier) {
            self.by_channel.remove(&channel_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interop_types::{AppId, FullyQualifiedAppId, InstanceId};

    fn fqai(local: &str, instance: &str) -> FullyQualifiedAppIdentifier {
        FullyQualifiedAppIdentifier::new(
            FullyQualifiedAppId::new(&AppId::new(local), "dir.example.com"),
            InstanceId::new(instance),
        )
    }

    #[test]
    fn bind_then_lookup_both_directions() {
        let registry = ConnectionRegistry::new();
        let id = fqai("chat", "inst-1");
        registry.bind(id.clone(), ChannelId::new("chan-1"));

        assert_eq!(registry.channel_for(&id), Some(ChannelId::new("chan-1")));
        assert_eq!(registry.identifier_for(&ChannelId::new("chan-1")), Some(id));
    }

    #[test]
    fn remove_clears_both_maps() {
        let registry = ConnectionRegistry::new();
        let id = fqai("chat", "inst-1");
        registry.bind(id.clone(), ChannelId::new("chan-1"));
        registry.remove(&id);

        assert_eq!(registry.channel_for(&id), None);
        assert_eq!(registry.identifier_for(&ChannelId::new("chan-1")), None);
    }
}
