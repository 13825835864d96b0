//! The `Root` struct: owns every domain engine plus the outbound ports
//! needed to answer the transport (§4.I). Built once by the composition
//! layer and shared as an `Arc` across every connection task.

use dashmap::DashMap;
use interop_domain::{AppDirectory, ChannelEngine, ConnectionRegistry, EventListenerRegistry, HeartbeatRegistry, IntentEngine, OpenOrchestrator};
use interop_ports::{ClockPort, OutboundGateway, Transport};
use interop_types::{ChannelId, ConnectionAttemptId, ListenerId};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

/// The coordinator's process-wide domain state plus its outbound ports.
/// Every field here is either lock-free internally (`DashMap`-backed
/// domain engines) or cheap to clone (`Arc<dyn ...>` ports), so `route`
/// and friends only ever need `&self`.
pub struct Root {
    pub(crate) directory: AppDirectory,
    pub(crate) channels: ChannelEngine,
    pub(crate) intents: IntentEngine,
    pub(crate) open: OpenOrchestrator,
    pub(crate) events: EventListenerRegistry,
    pub(crate) heartbeats: HeartbeatRegistry,
    pub(crate) connections: ConnectionRegistry,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) gateway: Arc<dyn OutboundGateway>,
    pub(crate) clock: Arc<dyn ClockPort>,
    /// Channels that have sent `WCP1Hello` but not yet completed
    /// `WCP4ValidateAppIdentity` (§4.A steps 1-4).
    pub(crate) pending_hello: DashMap<ChannelId, ConnectionAttemptId>,
    /// Bookkeeping the wire protocol itself has no slot for: which
    /// instance and intent a dynamic `addIntentListenerRequest` belongs
    /// to, so `intentListenerUnsubscribeRequest` knows what to drop from
    /// the directory's dynamic registry (§4.C `registerIntentListener`
    /// carries no listener uuid of its own).
    pub(crate) intent_listener_owners: DashMap<ListenerId, (interop_types::FullyQualifiedAppIdentifier, String)>,
    pub(crate) identity_timeout: Duration,
    pub(crate) context_handoff_timeout: Duration,
    /// Stored verbatim from `RootConfig`; not consulted by any operation
    /// exercised in this rendering (see DESIGN.md).
    #[allow(dead_code)]
    pub(crate) identity_url: Option<String>,
    pub(crate) shutdown: CancellationToken,
    self_ref: OnceCell<Weak<Root>>,
}

#[allow(clippy::too_many_arguments)]
impl Root {
    pub fn new(
        directory: AppDirectory,
        channels: ChannelEngine,
        intents: IntentEngine,
        open: OpenOrchestrator,
        events: EventListenerRegistry,
        heartbeats: HeartbeatRegistry,
        connections: ConnectionRegistry,
        transport: Arc<dyn Transport>,
        gateway: Arc<dyn OutboundGateway>,
        clock: Arc<dyn ClockPort>,
        identity_timeout: Duration,
        context_handoff_timeout: Duration,
        identity_url: Option<String>,
        shutdown: CancellationToken,
    ) -> Arc<Root> {
        let root = Arc::new(Root {
            directory,
            channels,
            intents,
            open,
            events,
            heartbeats,
            connections,
            transport,
            gateway,
            clock,
            pending_hello: DashMap::new(),
            intent_listener_owners: DashMap::new(),
            identity_timeout,
            context_handoff_timeout,
            identity_url,
            shutdown,
            self_ref: OnceCell::new(),
        });
        // `set` only fails if already initialized, which can't happen on a
        // freshly constructed Arc.
        let _ = root.self_ref.set(Arc::downgrade(&root));
        root
    }

    /// Recover the owning `Arc` from inside a `&self` method, for spawning
    /// tasks that must outlive the call (heartbeat loops, pending-raise
    /// followups). Panics if called before `new` finishes constructing the
    /// `Arc`, which cannot happen for any method reachable from outside
    /// this crate.
    pub(crate) fn arc(&self) -> Arc<Root> {
        self.self_ref
            .get()
            .expect("self_ref set in Root::new")
            .upgrade()
            .expect("Root outlives every task spawned from it")
    }

    /// The coordinator's own identity, used as `ResponseMeta::source` and
    /// never registered as a live instance (§4.H "the root never monitors
    /// itself").
    pub fn identity() -> interop_types::FullyQualifiedAppIdentifier {
        interop_types::FullyQualifiedAppIdentifier::new(
            interop_types::FullyQualifiedAppId::new(&interop_types::AppId::new("interop-root"), "root"),
            interop_types::InstanceId::new("singleton"),
        )
    }
}
