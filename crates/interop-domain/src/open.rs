//! The open/launch orchestrator (§4.F): strategy selection, the
//! identity-validation await, and the context-handoff await.

use crate::errors::OpenError;
use dashmap::DashMap;
use interop_ports::{OpenApplicationStrategy, OpenRequestDescriptor};
use interop_types::{ConnectionAttemptId, FullyQualifiedAppIdentifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

pub struct OpenOrchestrator {
    strategies: Vec<Arc<dyn OpenApplicationStrategy>>,
    pending_identity: DashMap<ConnectionAttemptId, oneshot::Sender<FullyQualifiedAppIdentifier>>,
    context_ready: DashMap<FullyQualifiedAppIdentifier, Arc<Notify>>,
}

impl OpenOrchestrator {
    pub fn new(strategies: Vec<Arc<dyn OpenApplicationStrategy>>) -> Self {
        Self {
            strategies,
            pending_identity: DashMap::new(),
            context_ready: DashMap::new(),
        }
    }

    /// §4.F step 3: the first configured strategy whose `can_open` check
    /// succeeds.
    fn select_strategy(&self, descriptor: &OpenRequestDescriptor) -> Option<Arc<dyn OpenApplicationStrategy>> {
        self.strategies.iter().find(|s| s.can_open(descriptor)).cloned()
    }

    /// §4.F step 3-4: select and invoke a strategy, returning the
    /// `connectionAttemptUuid` its launch promises to carry through the
    /// new instance's handshake.
    pub async fn launch(&self, descriptor: &OpenRequestDescriptor) -> Result<ConnectionAttemptId, OpenError> {
        let strategy = self
            .select_strategy(descriptor)
            .ok_or_else(|| OpenError::ErrorOnLaunch("no open strategy accepted this app".to_string()))?;
        strategy.open(descriptor).await.map_err(|e| OpenError::ErrorOnLaunch(e.to_string()))
    }

    /// Register interest in a launch's identity validation before it
    /// arrives, returning the receiver to await (§4.F step 5).
    pub fn begin_awaiting_identity(&self, attempt: ConnectionAttemptId) -> oneshot::Receiver<FullyQualifiedAppIdentifier> {
        let (tx, rx) = oneshot::channel();
        self.pending_identity.insert(attempt, tx);
        rx
    }

    /// Called from the handshake path (§4.A step 4) when a
    /// `notifyContextRequest` carries a `connectionAttemptUuid` matching an
    /// outstanding launch. Returns `true` if a waiter was woken.
    pub fn resolve_identity(&self, attempt: &ConnectionAttemptId, identifier: FullyQualifiedAppIdentifier) -> bool {
        match self.pending_identity.remove(attempt) {
            Some((_, tx)) => tx.send(identifier).is_ok(),
            None => false,
        }
    }

    /// §4.F step 5: a default 15-second timeout; expiry yields `AppTimeout`.
    pub async fn await_identity(
        rx: oneshot::Receiver<FullyQualifiedAppIdentifier>,
        timeout: Duration,
    ) -> Result<FullyQualifiedAppIdentifier, OpenError> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(identifier)) => Ok(identifier),
            Ok(Err(_)) | Err(_) => Err(OpenError::AppTimeout),
        }
    }

    fn notify_handle(&self, instance: &FullyQualifiedAppIdentifier) -> Arc<Notify> {
        self.context_ready.entry(instance.clone()).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    /// Called whenever `instance` successfully registers a context
    /// listener anywhere (§4.D `addContextListener`), waking anyone
    /// awaiting the context-handoff step for it (§4.F step 6).
    pub fn notify_context_listener_registered(&self, instance: &FullyQualifiedAppIdentifier) {
        if let Some(notify) = self.context_ready.get(instance) {
            notify.notify_waiters();
        }
    }

    /// §4.F step 6: wait until `has_matching_listener` reports true, or
    /// time out.
    pub async fn await_context_listener(
        &self,
        instance: &FullyQualifiedAppIdentifier,
        timeout: Duration,
        has_matching_listener: impl Fn() -> bool,
    ) -> Result<(), OpenError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if has_matching_listener() {
                return Ok(());
            }
            let notify = self.notify_handle(instance);
            let notified = notify.notified();
            if has_matching_listener() {
                return Ok(());
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Err(OpenError::AppTimeout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interop_ports::OpenStrategyError;
    use interop_types::{AppDetails, AppId, AppRecord, FullyQualifiedAppId, InstanceId};
    use std::collections::BTreeMap;

    fn identifier(local: &str) -> FullyQualifiedAppIdentifier {
        FullyQualifiedAppIdentifier::new(
            FullyQualifiedAppId::new(&AppId::new(local), "dir.example.com"),
            InstanceId::new(format!("{local}-inst")),
        )
    }

    fn descriptor() -> OpenRequestDescriptor {
        OpenRequestDescriptor {
            app_directory_record: AppRecord {
                app_id: "grid".to_string(),
                name: None,
                details: AppDetails::Web {
                    url: "https://grid.example.com".to_string(),
                },
                intents: BTreeMap::new(),
            },
            context: None,
        }
    }

    struct AlwaysOpens(&'static str);

    #[async_trait::async_trait]
    impl OpenApplicationStrategy for AlwaysOpens {
        fn can_open(&self, _descriptor: &OpenRequestDescriptor) -> bool {
            true
        }

        async fn open(&self, _descriptor: &OpenRequestDescriptor) -> Result<ConnectionAttemptId, OpenStrategyError> {
            Ok(ConnectionAttemptId::new(self.0))
        }
    }

    struct NeverOpens;

    #[async_trait::async_trait]
    impl OpenApplicationStrategy for NeverOpens {
        fn can_open(&self, _descriptor: &OpenRequestDescriptor) -> bool {
            false
        }

        async fn open(&self, _descriptor: &OpenRequestDescriptor) -> Result<ConnectionAttemptId, OpenStrategyError> {
            unreachable!("can_open returned false")
        }
    }

    #[tokio::test]
    async fn launch_uses_the_first_strategy_that_accepts() {
        let orchestrator = OpenOrchestrator::new(vec![Arc::new(NeverOpens), Arc::new(AlwaysOpens("attempt-1"))]);
        let attempt = orchestrator.launch(&descriptor()).await.unwrap();
        assert_eq!(attempt, ConnectionAttemptId::new("attempt-1"));
    }

    #[tokio::test]
    async fn launch_fails_when_no_strategy_accepts() {
        let orchestrator = OpenOrchestrator::new(vec![Arc::new(NeverOpens)]);
        assert!(orchestrator.launch(&descriptor()).await.is_err());
    }

    #[tokio::test]
    async fn await_identity_times_out_when_never_resolved() {
        let orchestrator = OpenOrchestrator::new(vec![]);
        let rx = orchestrator.begin_awaiting_identity(ConnectionAttemptId::new("attempt-1"));
        let result = OpenOrchestrator::await_identity(rx, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(OpenError::AppTimeout)));
    }

    #[tokio::test]
    async fn await_identity_resolves_on_matching_attempt() {
        let orchestrator = Arc::new(OpenOrchestrator::new(vec![]));
        let attempt = ConnectionAttemptId::new("attempt-1");
        let rx = orchestrator.begin_awaiting_identity(attempt.clone());

        let woken = orchestrator.resolve_identity(&attempt, identifier("grid"));
        assert!(woken);

        let result = OpenOrchestrator::await_identity(rx, Duration::from_secs(1)).await.unwrap();
        assert_eq!(result, identifier("grid"));
    }

    #[tokio::test]
    async fn await_context_listener_times_out() {
        let orchestrator = OpenOrchestrator::new(vec![]);
        let result = orchestrator
            .await_context_listener(&identifier("grid"), Duration::from_millis(20), || false)
            .await;
        assert!(matches!(result, Err(OpenError::AppTimeout)));
    }
}
