//! `Event` payloads: root -> proxy, uncorrelated (addressed by the
//! transport layer via `ChannelId`/`InstanceId`, not by `requestUuid`).

use interop_types::{ChannelId, Context, FullyQualifiedAppIdentifier, ListenerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventPayload {
    /// Delivered to the target of a raised intent once it has registered a
    /// matching listener (§4.E step 5). `raise_intent_request_uuid` is the
    /// opaque pending-intent token; the target echoes it verbatim in its
    /// later `intentResultRequest`.
    #[serde(rename = "intentEvent")]
    Intent {
        intent: String,
        context: Context,
        originating_app: FullyQualifiedAppIdentifier,
        raise_intent_request_uuid: String,
    },

    /// Delivered to every matching listener on a channel when a broadcast
    /// lands (§4.D), and directly to a newly opened instance as the
    /// context-handoff step of `openRequest` (§4.F step 6, `channel_id:
    /// None`).
    #[serde(rename = "broadcastEvent")]
    Broadcast {
        #[serde(skip_serializing_if = "Option::is_none")]
        channel_id: Option<ChannelId>,
        context: Context,
        originating_app: FullyQualifiedAppIdentifier,
    },

    /// Delivered to an instance's `userChannelChanged` agent-event
    /// listeners when it joins a new user channel (§4.D).
    #[serde(rename = "userChannelChangedEvent")]
    UserChannelChanged {
        #[serde(skip_serializing_if = "Option::is_none")]
        channel_id: Option<ChannelId>,
    },

    /// Liveness probe (§4.H); `event_uuid` duplicates the envelope's own
    /// `meta.eventUuid` so `heartbeatAcknowledgementRequest` can reference
    /// it without unpacking the envelope.
    #[serde(rename = "heartbeatEvent")]
    Heartbeat { event_uuid: String },

    /// Private-channel namespace event (§4.G): another participant added a
    /// context listener.
    #[serde(rename = "privateChannelAddContextListenerEvent")]
    PrivateChannelAddContextListener {
        channel_id: ChannelId,
        instance: FullyQualifiedAppIdentifier,
        #[serde(skip_serializing_if = "Option::is_none")]
        context_type: Option<String>,
    },

    /// Private-channel namespace event: another participant unsubscribed
    /// one of their listeners.
    #[serde(rename = "privateChannelUnsubscribeEvent")]
    PrivateChannelUnsubscribe {
        channel_id: ChannelId,
        instance: FullyQualifiedAppIdentifier,
        listener_uuid: ListenerId,
    },

    /// Private-channel namespace event: another participant disconnected
    /// (explicitly or via heartbeat timeout).
    #[serde(rename = "privateChannelDisconnectEvent")]
    PrivateChannelDisconnect {
        channel_id: ChannelId,
        instance: FullyQualifiedAppIdentifier,
    },
}

impl EventPayload {
    pub fn type_tag(&self) -> &'static str {
        match self {
            EventPayload::Intent { .. } => "intentEvent",
            EventPayload::Broadcast { .. } => "broadcastEvent",
            EventPayload::UserChannelChanged { .. } => "userChannelChangedEvent",
            EventPayload::Heartbeat { .. } => "heartbeatEvent",
            EventPayload::PrivateChannelAddContextListener { .. } => {
                "privateChannelAddContextListenerEvent"
            }
            EventPayload::PrivateChannelUnsubscribe { .. } => "privateChannelUnsubscribeEvent",
            EventPayload::PrivateChannelDisconnect { .. } => "privateChannelDisconnectEvent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interop_types::{AppId, FullyQualifiedAppId, InstanceId};

    fn fqai() -> FullyQualifiedAppIdentifier {
        FullyQualifiedAppIdentifier::new(
            FullyQualifiedAppId::new(&AppId::new("chat"), "dir.example.com"),
            InstanceId::new("inst-1"),
        )
    }

    #[test]
    fn intent_event_round_trips() {
        let payload = EventPayload::Intent {
            intent: "StartChat".to_string(),
            context: Context::new("fdc3.contact"),
            originating_app: fqai(),
            raise_intent_request_uuid: "token-1".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "intentEvent");
        let decoded: EventPayload = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.type_tag(), "intentEvent");
    }
}
