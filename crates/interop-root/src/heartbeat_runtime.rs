//! Spawns and drives each instance's heartbeat tick loop, and the shared
//! disconnect cascade every other cleanup path (closed socket, heartbeat
//! timeout) runs through (§4.H).

use crate::root::Root;
use interop_domain::Tick;
use interop_protocol::{EventEnvelope, EventMeta, EventPayload};
use interop_types::FullyQualifiedAppIdentifier;

impl Root {
    /// Runs once per live instance, for the lifetime of its `Monitor`'s
    /// cancellation token (child of the root's own shutdown token, so a
    /// process-wide shutdown tears down every loop at once).
    pub(crate) fn spawn_heartbeat_loop(&self, instance: FullyQualifiedAppIdentifier) {
        let root = self.arc();
        let monitor = self.heartbeats.ensure_monitor(&instance);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(root.heartbeats.interval());
            ticker.tick().await; // the first tick fires immediately; discard it

            loop {
                tokio::select! {
                    _ = monitor.cancellation.cancelled() => break,
                    _ = ticker.tick() => match monitor.tick() {
                        Tick::Emit { event_uuid } => {
                            let Some(channel_id) = root.connections.channel_for(&instance) else { break };
                            let meta = EventMeta::new(root.clock.now_rfc3339());
                            root.gateway
                                .send_event(channel_id, EventEnvelope { payload: EventPayload::Heartbeat { event_uuid }, meta })
                                .await;
                        }
                        Tick::Disconnect => {
                            root.disconnect(&instance, true).await;
                            break;
                        }
                    },
                }
            }
        });
    }

    /// The full disconnect cascade (§4.H "Disconnection"): every domain
    /// component sheds its bookkeeping for `instance`, in the order that
    /// lets later steps still observe earlier state (directory removal
    /// before intent failure, so the failed raises' originators are still
    /// resolvable).
    pub(crate) async fn disconnect(&self, instance: &FullyQualifiedAppIdentifier, close_transport: bool) {
        self.heartbeats.remove(instance);
        self.directory.remove_instance(instance);
        self.events.remove_instance(instance);

        let deliveries = self.channels.remove_instance(instance);
        self.deliver(deliveries).await;

        let failed_originators = self.intents.fail_pending_for_target(instance);
        if !failed_originators.is_empty() {
            tracing::debug!(
                instance = %instance,
                count = failed_originators.len(),
                "failed pending raises targeting disconnected instance"
            );
        }

        let channel_id = self.connections.channel_for(instance);
        self.connections.remove(instance);
        if close_transport {
            if let Some(channel_id) = channel_id {
                self.transport.close(channel_id).await;
            }
        }
    }
}
