//! The event listener registry (§4.G): two namespaces — agent events
//! (currently only `userChannelChanged`) and private-channel events — each
//! keyed by `{instance, eventType|null, uuid}`.

use dashmap::DashMap;
use interop_types::{FullyQualifiedAppIdentifier, ListenerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventNamespace {
    Agent,
    PrivateChannel,
}

#[derive(Debug, Clone)]
struct ListenerEntry {
    instance: FullyQualifiedAppIdentifier,
    event_type: Option<String>,
    sequence: u64,
}

impl ListenerEntry {
    fn matches(&self, event_type: &str) -> bool {
        self.event_type.as_deref().map(|t| t == event_type).unwrap_or(true)
    }
}

/// One namespace's listener table. Delivery order across multiple
/// listeners belonging to the same instance follows subscription order
/// (§4.G), so each entry carries a monotonic `sequence`.
#[derive(Default)]
struct Namespace {
    listeners: DashMap<ListenerId, ListenerEntry>,
    sequence: std::sync::atomic::AtomicU64,
}

impl Namespace {
    fn add(&self, instance: FullyQualifiedAppIdentifier, event_type: Option<String>) -> ListenerId {
        let sequence = self.sequence.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let listener_id = ListenerId::new(format!("evt-listener-{sequence}-{}", uuid::Uuid::new_v4()));
        self.listeners.insert(
            listener_id.clone(),
            ListenerEntry {
                instance,
                event_type,
                sequence,
            },
        );
        listener_id
    }

    /// Silently no-ops if `listener_id` is unknown (§4.G "Unsubscribe
    /// removes by uuid, silently no-op if unknown").
    fn remove(&self, listener_id: &ListenerId) {
        self.listeners.remove(listener_id);
    }

    /// Instances subscribed to `event_type` on `instance`, in subscription
    /// order. Used for fan-out within one instance's own listeners; cross
    /// instance fan-out (e.g. broadcasting to many instances) calls this
    /// once per target instance.
    fn matching_for_instance(&self, instance: &FullyQualifiedAppIdentifier, event_type: &str) -> bool {
        self.listeners
            .iter()
            .filter(|e| &e.instance == instance)
            .any(|e| e.matches(event_type))
    }

    fn remove_instance(&self, instance: &FullyQualifiedAppIdentifier) {
        let stale: Vec<ListenerId> = self
            .listeners
            .iter()
            .filter(|e| &e.instance == instance)
            .map(|e| e.key().clone())
            .collect();
        for id in stale {
            self.listeners.remove(&id);
        }
    }
}

#[derive(Default)]
pub struct EventListenerRegistry {
    agent: Namespace,
    private_channel: Namespace,
}

impl EventListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `addEventListener` (agent namespace).
    pub fn add_agent_listener(&self, instance: FullyQualifiedAppIdentifier, event_type: Option<String>) -> ListenerId {
        self.agent.add(instance, event_type)
    }

    pub fn remove_agent_listener(&self, listener_id: &ListenerId) {
        self.agent.remove(listener_id);
    }

    /// Whether `instance` should receive an agent event of `event_type`
    /// (e.g. `"userChannelChanged"`), per its subscriptions.
    pub fn wants_agent_event(&self, instance: &FullyQualifiedAppIdentifier, event_type: &str) -> bool {
        self.agent.matching_for_instance(instance, event_type)
    }

    /// Registration hook for private-channel participation; the channel
    /// engine tracks membership itself, this registry only tracks whether
    /// an instance cares about the private-channel namespace's events.
    /// Kept separate from `agent` so the two namespaces never collide on
    /// event-type strings.
    pub fn add_private_channel_listener(&self, instance: FullyQualifiedAppIdentifier, event_type: Option<String>) -> ListenerId {
        self.private_channel.add(instance, event_type)
    }

    pub fn remove_private_channel_listener(&self, listener_id: &ListenerId) {
        self.private_channel.remove(listener_id);
    }

    pub fn wants_private_channel_event(&self, instance: &FullyQualifiedAppIdentifier, event_type: &str) -> bool {
        self.private_channel.matching_for_instance(instance, event_type)
    }

    /// §4.H disconnect cleanup: drop every listener an instance held in
    /// both namespaces.
    pub fn remove_instance(&self, instance: &FullyQualifiedAppIdentifier) {
        self.agent.remove_instance(instance);
        self.private_channel.remove_instance(instance);
    }
}
