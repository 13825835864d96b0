//! The channel engine (§4.D): user/app/private channels, sticky context,
//! listener dispatch and private-channel allow-lists.
//!
//! Pure domain logic — no transport I/O. Callers (the root dispatcher)
//! turn the [`Delivery`] values this module returns into actual
//! `OutboundGateway::send_event` calls after resolving each target's
//! transport channel via the `ConnectionRegistry`.

use crate::errors::ChannelError;
use dashmap::DashMap;
use interop_protocol::events::EventPayload;
use interop_types::{Channel, ChannelType, Context, DisplayMetadata, FullyQualifiedAppIdentifier, ListenerId};
use std::collections::HashSet;

/// An event this module has decided to send, addressed by instance. The
/// caller resolves `target` to a transport channel and an envelope.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub target: FullyQualifiedAppIdentifier,
    pub event: EventPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenerScope {
    /// Bound to one specific channel for its lifetime.
    Fixed,
    /// Registered with `channelId: null`; resolved against the instance's
    /// current user channel at dispatch time (§4.D "User-channel
    /// membership").
    CurrentUserChannel,
}

#[derive(Debug, Clone)]
struct ContextListenerEntry {
    instance: FullyQualifiedAppIdentifier,
    type_filter: Option<String>,
    channel_id: Option<interop_types::ChannelId>,
    scope: ListenerScope,
}

impl ContextListenerEntry {
    fn matches(&self, context_type: &str) -> bool {
        self.type_filter.as_deref().map(|t| t == context_type).unwrap_or(true)
    }
}

#[derive(Debug)]
struct ChannelState {
    descriptor: Channel,
    sticky_by_type: std::collections::HashMap<String, Context>,
    last_broadcast: Option<Context>,
    allow_list: Option<HashSet<FullyQualifiedAppIdentifier>>,
}

impl ChannelState {
    fn new(descriptor: Channel) -> Self {
        Self {
            descriptor,
            sticky_by_type: std::collections::HashMap::new(),
            last_broadcast: None,
            allow_list: None,
        }
    }

    fn private(descriptor: Channel, creator: FullyQualifiedAppIdentifier) -> Self {
        let mut allow_list = HashSet::new();
        allow_list.insert(creator);
        Self {
            descriptor,
            sticky_by_type: std::collections::HashMap::new(),
            last_broadcast: None,
            allow_list: Some(allow_list),
        }
    }

    fn record(&mut self, context: Context) {
        self.sticky_by_type.insert(context.context_type.clone(), context.clone());
        self.last_broadcast = Some(context);
    }

    fn current_context(&self, context_type: Option<&str>) -> Option<Context> {
        match context_type {
            Some(ct) => self.sticky_by_type.get(ct).cloned(),
            None => self.last_broadcast.clone(),
        }
    }

    fn can_access(&self, instance: &FullyQualifiedAppIdentifier) -> bool {
        match &self.allow_list {
            None => true,
            Some(allowed) => allowed.contains(instance),
        }
    }
}

pub struct ChannelEngine {
    channels: DashMap<interop_types::ChannelId, ChannelState>,
    user_channel_ids: Vec<interop_types::ChannelId>,
    current_user_channel: DashMap<FullyQualifiedAppIdentifier, interop_types::ChannelId>,
    listeners: DashMap<ListenerId, ContextListenerEntry>,
    listener_counter: std::sync::atomic::AtomicU64,
}

impl ChannelEngine {
    /// Pre-declare the default set of user channels (§4.D).
    pub fn new(default_user_channels: Vec<Channel>) -> Self {
        let channels = DashMap::new();
        let mut user_channel_ids = Vec::new();
        for channel in default_user_channels {
            user_channel_ids.push(channel.id.clone());
            channels.insert(channel.id.clone(), ChannelState::new(channel));
        }
        Self {
            channels,
            user_channel_ids,
            current_user_channel: DashMap::new(),
            listeners: DashMap::new(),
            listener_counter: std::sync::atomic::AtomicU64::new(0),
        }
    }

    fn next_listener_id(&self) -> ListenerId {
        let n = self.listener_counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        ListenerId::new(format!("ctx-listener-{n}-{}", uuid::Uuid::new_v4()))
    }

    /// `getOrCreateChannel`: lazily allocates an app channel on first use.
    pub fn get_or_create_channel(&self, channel_id: interop_types::ChannelId) -> Channel {
        self.channels
            .entry(channel_id.clone())
            .or_insert_with(|| ChannelState::new(Channel::new(channel_id, ChannelType::App)))
            .descriptor
            .clone()
    }

    /// `createPrivateChannel`: always allocates a fresh channel.
    pub fn create_private_channel(&self, creator: FullyQualifiedAppIdentifier) -> Channel {
        let id = interop_types::ChannelId::new(uuid::Uuid::new_v4().to_string());
        let descriptor = Channel::new(id.clone(), ChannelType::Private);
        self.channels.insert(id, ChannelState::private(descriptor.clone(), creator));
        descriptor
    }

    /// Insert `instance` into a private channel's allow-list (§4.E
    /// `onIntentResult` step 3). No-op, successfully, for non-private
    /// channels (callers need not special-case this).
    pub fn grant_private_access(&self, channel_id: &interop_types::ChannelId, instance: FullyQualifiedAppIdentifier) {
        if let Some(mut entry) = self.channels.get_mut(channel_id) {
            if let Some(allow_list) = entry.allow_list.as_mut() {
                allow_list.insert(instance);
            }
        }
    }

    pub fn get_user_channels(&self) -> Vec<Channel> {
        self.user_channel_ids
            .iter()
            .filter_map(|id| self.channels.get(id).map(|e| e.descriptor.clone()))
            .collect()
    }

    /// `joinUserChannel`.
    pub fn join_user_channel(
        &self,
        instance: FullyQualifiedAppIdentifier,
        channel_id: interop_types::ChannelId,
    ) -> Result<(), ChannelError> {
        if !self.user_channel_ids.contains(&channel_id) {
            return Err(ChannelError::NoChannelFound);
        }
        self.current_user_channel.insert(instance, channel_id);
        Ok(())
    }

    /// `leaveCurrentChannel`.
    pub fn leave_current_channel(&self, instance: &FullyQualifiedAppIdentifier) {
        self.current_user_channel.remove(instance);
    }

    pub fn current_user_channel_of(&self, instance: &FullyQualifiedAppIdentifier) -> Option<interop_types::ChannelId> {
        self.current_user_channel.get(instance).map(|e| e.clone())
    }

    /// True if `instance` has registered a context listener, anywhere,
    /// whose type filter is `None` or matches `context_type` (§4.F step 6
    /// "context-handoff" await).
    pub fn has_matching_context_listener(&self, instance: &FullyQualifiedAppIdentifier, context_type: &str) -> bool {
        self.listeners.iter().any(|e| &e.instance == instance && e.matches(context_type))
    }

    /// `getCurrentContext`.
    pub fn get_current_context(&self, channel_id: &interop_types::ChannelId, context_type: Option<&str>) -> Option<Context> {
        self.channels.get(channel_id)?.current_context(context_type)
    }

    /// `broadcast`: update the channel's sticky-context map, then fan out
    /// to every matching listener except the originator's own (§4.D
    /// "Listener dispatch").
    pub fn broadcast(
        &self,
        channel_id: &interop_types::ChannelId,
        context: Context,
        originator: &FullyQualifiedAppIdentifier,
    ) -> Result<Vec<Delivery>, ChannelError> {
        let mut entry = self.channels.get_mut(channel_id).ok_or(ChannelError::NoChannelFound)?;
        if !entry.can_access(originator) {
            return Err(ChannelError::AccessDenied);
        }
        entry.record(context.clone());
        drop(entry);

        let deliveries = self
            .listeners
            .iter()
            .filter(|e| &e.instance != originator)
            .filter(|e| self.listener_targets_channel(&e, channel_id))
            .filter(|e| e.matches(&context.context_type))
            .map(|e| Delivery {
                target: e.instance.clone(),
                event: EventPayload::Broadcast {
                    channel_id: Some(channel_id.clone()),
                    context: context.clone(),
                    originating_app: originator.clone(),
                },
            })
            .collect();
        Ok(deliveries)
    }

    fn listener_targets_channel(&self, entry: &ContextListenerEntry, channel_id: &interop_types::ChannelId) -> bool {
        match entry.scope {
            ListenerScope::Fixed => entry.channel_id.as_ref() == Some(channel_id),
            ListenerScope::CurrentUserChannel => self.current_user_channel_of(&entry.instance).as_ref() == Some(channel_id),
        }
    }

    /// `addContextListener`. `channel_id: None` registers a "follows the
    /// instance's current user channel" listener (§4.D).
    pub fn add_context_listener(
        &self,
        instance: FullyQualifiedAppIdentifier,
        channel_id: Option<interop_types::ChannelId>,
        context_type: Option<String>,
    ) -> Result<(ListenerId, Vec<Delivery>), ChannelError> {
        let (scope, resolved_channel) = match &channel_id {
            Some(id) => {
                let entry = self.channels.get(id).ok_or(ChannelError::NoChannelFound)?;
                if !entry.can_access(&instance) {
                    return Err(ChannelError::AccessDenied);
                }
                (ListenerScope::Fixed, Some(id.clone()))
            }
            None => (ListenerScope::CurrentUserChannel, None),
        };

        let listener_id = self.next_listener_id();
        self.listeners.insert(
            listener_id.clone(),
            ContextListenerEntry {
                instance: instance.clone(),
                type_filter: context_type.clone(),
                channel_id: resolved_channel.clone(),
                scope,
            },
        );

        let deliveries = match resolved_channel {
            Some(id) if self.is_private(&id) => self.private_participants(&id, &instance, |target| {
                Delivery {
                    target,
                    event: EventPayload::PrivateChannelAddContextListener {
                        channel_id: id.clone(),
                        instance: instance.clone(),
                        context_type: context_type.clone(),
                    },
                }
            }),
            _ => Vec::new(),
        };

        Ok((listener_id, deliveries))
    }

    /// Removes a context listener by uuid, silently no-op if unknown
    /// (§4.G, applied consistently to context listeners too). Returns any
    /// private-channel events owed to the other participants.
    pub fn unsubscribe(&self, listener_id: &ListenerId) -> Vec<Delivery> {
        let Some((_, entry)) = self.listeners.remove(listener_id) else {
            return Vec::new();
        };
        let Some(channel_id) = entry.channel_id.clone() else {
            return Vec::new();
        };
        if !self.is_private(&channel_id) {
            return Vec::new();
        }
        self.private_participants(&channel_id, &entry.instance, |target| Delivery {
            target,
            event: EventPayload::PrivateChannelUnsubscribe {
                channel_id: channel_id.clone(),
                instance: entry.instance.clone(),
                listener_uuid: listener_id.clone(),
            },
        })
    }

    fn is_private(&self, channel_id: &interop_types::ChannelId) -> bool {
        self.channels.get(channel_id).map(|e| e.descriptor.channel_type == ChannelType::Private).unwrap_or(false)
    }

    fn private_participants(
        &self,
        channel_id: &interop_types::ChannelId,
        exclude: &FullyQualifiedAppIdentifier,
        make_event: impl Fn(FullyQualifiedAppIdentifier) -> Delivery,
    ) -> Vec<Delivery> {
        let Some(entry) = self.channels.get(channel_id) else {
            return Vec::new();
        };
        let Some(allow_list) = entry.allow_list.as_ref() else {
            return Vec::new();
        };
        allow_list.iter().filter(|id| *id != exclude).cloned().map(make_event).collect()
    }

    /// Disconnect cleanup (§4.H): drop `instance` from every private
    /// channel's allow-list, remove its context listeners (fixed and
    /// floating), clear its current-user-channel, and notify the other
    /// participants of any private channel it belonged to.
    pub fn remove_instance(&self, instance: &FullyQualifiedAppIdentifier) -> Vec<Delivery> {
        self.current_user_channel.remove(instance);
        let stale: Vec<ListenerId> = self
            .listeners
            .iter()
            .filter(|e| &e.instance == instance)
            .map(|e| e.key().clone())
            .collect();
        for id in stale {
            self.listeners.remove(&id);
        }

        let mut deliveries = Vec::new();
        for mut entry in self.channels.iter_mut() {
            if entry.descriptor.channel_type != ChannelType::Private {
                continue;
            }
            let Some(allow_list) = entry.allow_list.as_mut() else { continue };
            if !allow_list.remove(instance) {
                continue;
            }
            let channel_id = entry.descriptor.id.clone();
            for participant in allow_list.iter() {
                deliveries.push(Delivery {
                    target: participant.clone(),
                    event: EventPayload::PrivateChannelDisconnect {
                        channel_id: channel_id.clone(),
                        instance: instance.clone(),
                    },
                });
            }
        }
        deliveries
    }
}

/// The reference default user-channel set: the eight FDC3-style color
/// channels, each tagged with its display color.
pub fn default_user_channels() -> Vec<Channel> {
    const COLORS: [(&str, &str, &str); 8] = [
        ("red", "Red", "#FF0000"),
        ("orange", "Orange", "#FFA500"),
        ("yellow", "Yellow", "#FFFF00"),
        ("green", "Green", "#00FF00"),
        ("cyan", "Cyan", "#00FFFF"),
        ("blue", "Blue", "#0000FF"),
        ("purple", "Purple", "#800080"),
        ("pink", "Pink", "#FFC0CB"),
    ];
    COLORS
        .into_iter()
        .map(|(id, name, color)| {
            let mut channel = Channel::new(interop_types::ChannelId::new(id), ChannelType::User);
            channel.display_metadata = Some(DisplayMetadata {
                name: Some(name.to_string()),
                color: Some(color.to_string()),
                glyph: None,
            });
            channel
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use interop_types::{AppId, FullyQualifiedAppId, InstanceId};

    fn instance(local: &str) -> FullyQualifiedAppIdentifier {
        FullyQualifiedAppIdentifier::new(
            FullyQualifiedAppId::new(&AppId::new(local), "dir.example.com"),
            InstanceId::new(format!("{local}-inst")),
        )
    }

    #[test]
    fn get_or_create_channel_is_idempotent() {
        let engine = ChannelEngine::new(vec![]);
        let id = interop_types::ChannelId::new("app-chan");
        let first = engine.get_or_create_channel(id.clone());
        let second = engine.get_or_create_channel(id.clone());
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn broadcast_excludes_originator_and_updates_sticky_context() {
        let engine = ChannelEngine::new(vec![]);
        let id = interop_types::ChannelId::new("app-chan");
        engine.get_or_create_channel(id.clone());

        let originator = instance("chat");
        let listener = instance("grid");
        let (listener_id, _) = engine
            .add_context_listener(listener.clone(), Some(id.clone()), None)
            .unwrap();
        let (self_listener_id, _) = engine
            .add_context_listener(originator.clone(), Some(id.clone()), None)
            .unwrap();
        assert_ne!(listener_id, self_listener_id);

        let deliveries = engine
            .broadcast(&id, Context::new("fdc3.contact"), &originator)
            .unwrap();

        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].target, listener);
        assert_eq!(engine.get_current_context(&id, Some("fdc3.contact")), Some(Context::new("fdc3.contact")));
    }

    #[test]
    fn private_channel_denies_non_participants() {
        let engine = ChannelEngine::new(vec![]);
        let creator = instance("chat");
        let stranger = instance("grid");
        let channel = engine.create_private_channel(creator.clone());

        let result = engine.broadcast(&channel.id, Context::new("fdc3.contact"), &stranger);
        assert_eq!(result.unwrap_err(), ChannelError::AccessDenied);

        let ok = engine.broadcast(&channel.id, Context::new("fdc3.contact"), &creator);
        assert!(ok.is_ok());
    }

    #[test]
    fn join_user_channel_migrates_floating_listeners() {
        let engine = ChannelEngine::new(default_user_channels());
        let red = interop_types::ChannelId::new("red");
        let green = interop_types::ChannelId::new("green");
        let watcher = instance("grid");
        let broadcaster = instance("chat");

        engine.add_context_listener(watcher.clone(), None, None).unwrap();
        engine.join_user_channel(watcher.clone(), red.clone()).unwrap();
        engine.join_user_channel(broadcaster.clone(), red.clone()).unwrap();

        let deliveries = engine.broadcast(&red, Context::new("fdc3.contact"), &broadcaster).unwrap();
        assert_eq!(deliveries.len(), 1);

        engine.join_user_channel(watcher.clone(), green.clone()).unwrap();
        let deliveries = engine.broadcast(&green, Context::new("fdc3.contact"), &broadcaster).unwrap();
        assert_eq!(deliveries.len(), 0, "broadcaster hasn't joined green");

        engine.join_user_channel(broadcaster.clone(), green.clone()).unwrap();
        let deliveries = engine.broadcast(&green, Context::new("fdc3.contact"), &broadcaster).unwrap();
        assert_eq!(deliveries.len(), 1, "listener followed the user to green");
    }

    #[test]
    fn unsubscribe_unknown_listener_is_a_no_op() {
        let engine = ChannelEngine::new(vec![]);
        let deliveries = engine.unsubscribe(&ListenerId::new("never-registered"));
        assert!(deliveries.is_empty());
    }

    #[test]
    fn disconnect_notifies_other_private_channel_participants() {
        let engine = ChannelEngine::new(vec![]);
        let creator = instance("chat");
        let joiner = instance("grid");
        let channel = engine.create_private_channel(creator.clone());
        engine.grant_private_access(&channel.id, joiner.clone());

        let deliveries = engine.remove_instance(&joiner);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].target, creator);
    }
}
