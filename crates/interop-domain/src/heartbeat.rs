//! The heartbeat monitor (§4.H): a per-instance liveness timer, independent
//! of every other instance's, torn down by the root's shutdown token.

use dashmap::DashMap;
use interop_types::FullyQualifiedAppIdentifier;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What a monitor tick decided to do. The caller (the root dispatcher's
/// wiring) turns `Emit` into an actual `HeartbeatEvent` publish and
/// `Disconnect` into the full disconnect cascade across every other domain
/// component (§4.H "Disconnection").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Emit { event_uuid: String },
    Disconnect,
}

struct MonitorState {
    outstanding: Option<String>,
    misses: u32,
}

/// One instance's monitor: owns its own `tokio::time::interval` and
/// `CancellationToken` child, so dropping or cancelling it tears the timer
/// down without any other bookkeeping (§4.H).
pub struct Monitor {
    instance: FullyQualifiedAppIdentifier,
    state: std::sync::Mutex<MonitorState>,
    max_misses: u32,
    pub cancellation: CancellationToken,
}

impl Monitor {
    fn new(instance: FullyQualifiedAppIdentifier, max_misses: u32, parent: &CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            instance,
            state: std::sync::Mutex::new(MonitorState {
                outstanding: None,
                misses: 0,
            }),
            max_misses,
            cancellation: parent.child_token(),
        })
    }

    /// Called on every interval fire. If the previous emission is still
    /// outstanding, count a miss; past `max_misses` consecutive misses,
    /// report disconnect. Otherwise mint and record a fresh heartbeat.
    pub fn tick(&self) -> Tick {
        let mut guard = self.state.lock().expect("heartbeat monitor mutex poisoned");
        if guard.outstanding.is_some() {
            guard.misses += 1;
            if guard.misses >= self.max_misses {
                return Tick::Disconnect;
            }
        }
        let event_uuid = uuid::Uuid::new_v4().to_string();
        guard.outstanding = Some(event_uuid.clone());
        Tick::Emit { event_uuid }
    }

    /// `heartbeatAcknowledgementRequest`: resets the miss counter if
    /// `event_uuid` matches the outstanding emission. A stale or unknown
    /// uuid is ignored.
    pub fn acknowledge(&self, event_uuid: &str) {
        let mut guard = self.state.lock().expect("heartbeat monitor mutex poisoned");
        if guard.outstanding.as_deref() == Some(event_uuid) {
            guard.outstanding = None;
            guard.misses = 0;
        }
    }

    /// Treat a synchronous publish failure as an immediate disconnect
    /// (§4.H "If an emission throws synchronously ... treat it as an
    /// immediate disconnect").
    pub fn force_disconnect(&self) {
        self.cancellation.cancel();
    }

    pub fn instance(&self) -> &FullyQualifiedAppIdentifier {
        &self.instance
    }
}

/// Owns every live instance's [`Monitor`]. Spawning and running the actual
/// `tokio::time::interval` loop is the composition layer's job (it needs
/// the `OutboundGateway` to publish and the full disconnect cascade to
/// run); this registry only manages monitor lifecycle and state.
pub struct HeartbeatRegistry {
    monitors: DashMap<FullyQualifiedAppIdentifier, Arc<Monitor>>,
    interval: Duration,
    max_misses: u32,
    shutdown: CancellationToken,
}

impl HeartbeatRegistry {
    pub fn new(interval: Duration, max_misses: u32, shutdown: CancellationToken) -> Self {
        Self {
            monitors: DashMap::new(),
            interval,
            max_misses,
            shutdown,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// "On every inbound request from a non-root source, ensure a
    /// per-instance monitor exists." Returns the monitor, creating it on
    /// first observation of this instance.
    pub fn ensure_monitor(&self, instance: &FullyQualifiedAppIdentifier) -> Arc<Monitor> {
        self.monitors
            .entry(instance.clone())
            .or_insert_with(|| Monitor::new(instance.clone(), self.max_misses, &self.shutdown))
            .clone()
    }

    pub fn get(&self, instance: &FullyQualifiedAppIdentifier) -> Option<Arc<Monitor>> {
        self.monitors.get(instance).map(|e| e.clone())
    }

    /// Drops the instance's monitor entirely, cancelling its timer task.
    pub fn remove(&self, instance: &FullyQualifiedAppIdentifier) {
        if let Some((_, monitor)) = self.monitors.remove(instance) {
            monitor.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interop_types::{AppId, FullyQualifiedAppId, InstanceId};

    fn instance() -> FullyQualifiedAppIdentifier {
        FullyQualifiedAppIdentifier::new(
            FullyQualifiedAppId::new(&AppId::new("grid"), "dir.example.com"),
            InstanceId::new("grid-inst"),
        )
    }

    #[test]
    fn first_tick_emits_and_tracks_outstanding() {
        let monitor = Monitor::new(instance(), 3, &CancellationToken::new());
        match monitor.tick() {
            Tick::Emit { event_uuid } => assert!(!event_uuid.is_empty()),
            Tick::Disconnect => panic!("first tick should never disconnect"),
        }
    }

    #[test]
    fn acknowledging_resets_misses_and_allows_another_emission() {
        let monitor = Monitor::new(instance(), 2, &CancellationToken::new());
        let uuid = match monitor.tick() {
            Tick::Emit { event_uuid } => event_uuid,
            Tick::Disconnect => unreachable!(),
        };
        monitor.acknowledge(&uuid);
        match monitor.tick() {
            Tick::Emit { .. } => {}
            Tick::Disconnect => panic!("should have reset"),
        }
    }

    #[test]
    fn unacknowledged_ticks_eventually_disconnect() {
        let monitor = Monitor::new(instance(), 2, &CancellationToken::new());
        assert!(matches!(monitor.tick(), Tick::Emit { .. }));
        assert!(matches!(monitor.tick(), Tick::Emit { .. }));
        assert_eq!(monitor.tick(), Tick::Disconnect);
    }

    #[test]
    fn stale_acknowledgement_is_ignored() {
        let monitor = Monitor::new(instance(), 5, &CancellationToken::new());
        monitor.tick();
        monitor.acknowledge("not-the-outstanding-uuid");
        // misses still counted on the next tick because outstanding wasn't cleared
        assert!(!matches!(monitor.tick(), Tick::Disconnect));
    }

    #[test]
    fn ensure_monitor_is_idempotent_per_instance() {
        let registry = HeartbeatRegistry::new(Duration::from_millis(100), 3, CancellationToken::new());
        let a = registry.ensure_monitor(&instance());
        let b = registry.ensure_monitor(&instance());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn remove_cancels_the_monitor_token() {
        let registry = HeartbeatRegistry::new(Duration::from_millis(100), 3, CancellationToken::new());
        let monitor = registry.ensure_monitor(&instance());
        registry.remove(&instance());
        assert!(monitor.cancellation.is_cancelled());
        assert!(registry.get(&instance()).is_none());
    }
}
