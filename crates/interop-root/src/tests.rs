//! End-to-end dispatcher tests covering the literal scenarios laid out in
//! the boundary-behaviors walkthrough. These drive `Root::route` directly
//! rather than through the transport, with fake `Transport`/
//! `OutboundGateway` ports that record every envelope they would have
//! sent, so assertions can inspect exactly what the wire would have
//! carried.

use crate::root::Root;
use async_trait::async_trait;
use interop_domain::{AppDirectory, ChannelEngine, ConnectionRegistry, EventListenerRegistry, HeartbeatRegistry, IntentEngine, OpenOrchestrator};
use interop_ports::{
    AppDirectoryClient, DirectoryFetchError, FixedClock, InboundHandler, NoUiAppResolver, OpenApplicationStrategy,
    OpenRequestDescriptor, OpenStrategyError, OutboundGateway, Transport,
};
use interop_protocol::{AppIdentifierRef, EventEnvelope, EventPayload, RequestPayload, ResponseEnvelope, ResponsePayload};
use interop_types::{AppDetails, AppRecord, ChannelId, ConnectionAttemptId, FullyQualifiedAppIdentifier, InstanceId, RequestUuid, WireError};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct NullTransport;

#[async_trait]
impl Transport for NullTransport {
    async fn publish(&self, _channel_ids: Vec<ChannelId>, _payload: serde_json::Value) {}
    async fn close(&self, _channel_id: ChannelId) {}
    fn subscribe(&self, _handler: Arc<dyn InboundHandler>) {}
}

/// Captures every event the dispatcher hands the gateway, so tests can
/// assert on exactly what each instance would have received.
#[derive(Default)]
struct RecordingGateway {
    events: Mutex<Vec<(ChannelId, EventEnvelope)>>,
}

#[async_trait]
impl OutboundGateway for RecordingGateway {
    async fn send_response(&self, _channel_id: ChannelId, _response: ResponseEnvelope) {}

    async fn send_event(&self, channel_id: ChannelId, event: EventEnvelope) {
        self.events.lock().expect("gateway mutex poisoned").push((channel_id, event));
    }
}

struct RecordingTransport {
    closed: Mutex<Vec<ChannelId>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn publish(&self, _channel_ids: Vec<ChannelId>, _payload: serde_json::Value) {}
    async fn close(&self, channel_id: ChannelId) {
        self.closed.lock().expect("transport mutex poisoned").push(channel_id);
    }
    fn subscribe(&self, _handler: Arc<dyn InboundHandler>) {}
}

struct EmptyDirectoryClient;

#[async_trait]
impl AppDirectoryClient for EmptyDirectoryClient {
    async fn fetch_apps(&self, _base_url: &str) -> Result<Vec<AppRecord>, DirectoryFetchError> {
        Ok(Vec::new())
    }
}

struct StaticDirectoryClient(Vec<AppRecord>);

#[async_trait]
impl AppDirectoryClient for StaticDirectoryClient {
    async fn fetch_apps(&self, _base_url: &str) -> Result<Vec<AppRecord>, DirectoryFetchError> {
        Ok(self.0.clone())
    }
}

/// A harness with every `Root` collaborator wired to fakes, a directory
/// with no configured URLs (listener-only mode), so tests can register
/// instances directly by identity url without standing up a fake HTTP
/// directory.
struct Harness {
    root: Arc<Root>,
    gateway: Arc<RecordingGateway>,
}

fn harness() -> Harness {
    let directory = AppDirectory::new(Vec::new(), Arc::new(EmptyDirectoryClient), Arc::new(NoUiAppResolver));
    let channels = ChannelEngine::new(Vec::new());
    let intents = IntentEngine::new();
    let open = OpenOrchestrator::new(Vec::new());
    let events = EventListenerRegistry::new();
    let heartbeats = HeartbeatRegistry::new(Duration::from_secs(60), 3, CancellationToken::new());
    let connections = ConnectionRegistry::new();
    let transport: Arc<dyn Transport> = Arc::new(NullTransport);
    let gateway = Arc::new(RecordingGateway::default());

    let root = Root::new(
        directory,
        channels,
        intents,
        open,
        events,
        heartbeats,
        connections,
        transport,
        gateway.clone() as Arc<dyn OutboundGateway>,
        Arc::new(FixedClock("2026-07-31T00:00:00Z".to_string())),
        Duration::from_millis(500),
        Duration::from_millis(500),
        None,
        CancellationToken::new(),
    );

    Harness { root, gateway }
}

impl Harness {
    /// Registers a fresh live instance under the sentinel host (no
    /// directory configured) and binds it to a dedicated transport
    /// channel, returning its fully-qualified identifier.
    async fn connect(&self, local_app: &str) -> FullyQualifiedAppIdentifier {
        let (identifier, _record) = self
            .root
            .directory
            .register_new_instance(local_app, None)
            .await
            .expect("listener-only mode accepts any identity url");
        let channel_id = ChannelId::new(format!("chan-{local_app}"));
        self.root.connections.bind(identifier.clone(), channel_id);
        identifier
    }

    async fn route(&self, source: &FullyQualifiedAppIdentifier, request: RequestPayload) -> Option<ResponsePayload> {
        self.root
            .route(source.clone(), RequestUuid::new(format!("req-{}", uuid::Uuid::new_v4())), request)
            .await
    }

    fn events_for(&self, target: &FullyQualifiedAppIdentifier) -> Vec<EventPayload> {
        let channel_id = self.root.connections.channel_for(target).expect("target must be connected");
        self.gateway
            .events
            .lock()
            .expect("gateway mutex poisoned")
            .iter()
            .filter(|(c, _)| *c == channel_id)
            .map(|(_, e)| e.payload.clone())
            .collect()
    }

    fn targeted_ref(identifier: &FullyQualifiedAppIdentifier) -> AppIdentifierRef {
        AppIdentifierRef {
            app_id: identifier.app_id.local().as_str().to_string(),
            instance_id: Some(identifier.instance_id.as_str().to_string()),
        }
    }
}

/// A `raiseIntentRequest` addressed at a specific, already-connected
/// instance stays pending until that instance registers a matching
/// listener, then both the `intentEvent` and the `raiseIntentResponse`
/// fire.
#[tokio::test]
async fn late_listener_intent_is_delivered_once_registered() {
    let harness = Arc::new(harness());
    let source = harness.connect("chat").await;
    let target = harness.connect("grid").await;

    let raise_root = harness.root.clone();
    let raise_source = source.clone();
    let raise_target_ref = Harness::targeted_ref(&target);
    let raise = tokio::spawn(async move {
        raise_root
            .route(
                raise_source,
                RequestUuid::new("req-raise"),
                RequestPayload::RaiseIntent {
                    intent: "StartChat".to_string(),
                    context: serde_json::json!({"type": "fdc3.contact"}),
                    app: Some(raise_target_ref),
                },
            )
            .await
    });

    // Give the raise a chance to suspend on the (nonexistent) listener
    // before the target registers one.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!raise.is_finished(), "raise should still be pending with no listener registered");

    harness
        .route(
            &target,
            RequestPayload::AddIntentListener { intent: "StartChat".to_string(), contexts: vec!["fdc3.contact".to_string()] },
        )
        .await
        .expect("addIntentListenerRequest always answers");

    let response = tokio::time::timeout(Duration::from_secs(1), raise)
        .await
        .expect("raise should complete once the listener registers")
        .unwrap()
        .expect("raiseIntentRequest always answers");

    match response {
        ResponsePayload::RaiseIntent { intent_resolution: Some(resolution), error: None } => {
            assert_eq!(resolution.source, target);
            assert_eq!(resolution.intent, "StartChat");
        }
        other => panic!("unexpected response: {other:?}"),
    }

    let delivered = harness.events_for(&target);
    assert_eq!(delivered.len(), 1);
    match &delivered[0] {
        EventPayload::Intent { intent, originating_app, .. } => {
            assert_eq!(intent, "StartChat");
            assert_eq!(originating_app, &source);
        }
        other => panic!("expected an intentEvent, got {other:?}"),
    }
}

/// A malformed context fails validation before any target is resolved or
/// notified.
#[tokio::test]
async fn malformed_context_rejects_without_emitting_intent_event() {
    let harness = harness();
    let source = harness.connect("chat").await;

    let response = harness
        .route(
            &source,
            RequestPayload::RaiseIntent {
                intent: "X".to_string(),
                context: serde_json::json!("not-a-context"),
                app: None,
            },
        )
        .await
        .expect("raiseIntentRequest always answers");

    match response {
        ResponsePayload::RaiseIntent { intent_resolution: None, error: Some(WireError::MalformedContext) } => {}
        other => panic!("unexpected response: {other:?}"),
    }
    assert!(harness.events_for(&source).is_empty());
}

/// `findInstancesRequest` for an app the directory has never heard of
/// reports `NoAppsFound`, not a generic not-found error.
#[tokio::test]
async fn find_instances_of_unknown_app_reports_no_apps_found() {
    let harness = harness();
    let source = harness.connect("chat").await;

    let response = harness
        .route(
            &source,
            RequestPayload::FindInstances { app: AppIdentifierRef { app_id: "ghost@dir".to_string(), instance_id: None } },
        )
        .await
        .expect("findInstancesRequest always answers");

    match response {
        ResponsePayload::FindInstances { instances, error: Some(WireError::NoAppsFound) } => {
            assert!(instances.is_empty());
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

/// `max_misses` consecutive unacknowledged heartbeat ticks trigger the
/// full disconnect cascade: directory removal, connection teardown, and
/// transport close.
#[tokio::test]
async fn heartbeat_disconnect_removes_the_instance_everywhere() {
    let directory = AppDirectory::new(Vec::new(), Arc::new(EmptyDirectoryClient), Arc::new(NoUiAppResolver));
    let channels = ChannelEngine::new(Vec::new());
    let intents = IntentEngine::new();
    let open = OpenOrchestrator::new(Vec::new());
    let events = EventListenerRegistry::new();
    let heartbeats = HeartbeatRegistry::new(Duration::from_secs(60), 3, CancellationToken::new());
    let connections = ConnectionRegistry::new();
    let transport = Arc::new(RecordingTransport { closed: Mutex::new(Vec::new()) });
    let gateway = Arc::new(RecordingGateway::default());

    let root = Root::new(
        directory,
        channels,
        intents,
        open,
        events,
        heartbeats,
        connections,
        transport.clone() as Arc<dyn Transport>,
        gateway as Arc<dyn OutboundGateway>,
        Arc::new(FixedClock("2026-07-31T00:00:00Z".to_string())),
        Duration::from_millis(200),
        Duration::from_millis(200),
        None,
        CancellationToken::new(),
    );

    let (identifier, _) = root.directory.register_new_instance("chat", None).await.unwrap();
    let channel_id = ChannelId::new("chan-chat");
    root.connections.bind(identifier.clone(), channel_id.clone());
    let monitor = root.heartbeats.ensure_monitor(&identifier);

    let mut last_tick = monitor.tick();
    for _ in 0..3 {
        last_tick = monitor.tick();
    }
    assert_eq!(last_tick, interop_domain::Tick::Disconnect, "max_misses consecutive unacknowledged ticks should disconnect");

    root.disconnect(&identifier, true).await;

    assert!(root.connections.channel_for(&identifier).is_none());
    assert!(root.directory.get_app_instances(&identifier.app_id).await.unwrap().is_empty());
    assert!(transport.closed.lock().unwrap().contains(&channel_id));
}

/// An intent result naming a private channel grants the originator access,
/// so they can subsequently broadcast on it without an `AccessDenied`
/// error.
#[tokio::test]
async fn private_channel_result_allow_lists_the_originator() {
    let harness = Arc::new(harness());
    let source = harness.connect("chat").await;
    let target = harness.connect("grid").await;

    harness
        .route(
            &target,
            RequestPayload::AddIntentListener { intent: "StartChat".to_string(), contexts: vec!["fdc3.contact".to_string()] },
        )
        .await
        .unwrap();

    let response = harness
        .route(
            &source,
            RequestPayload::RaiseIntent {
                intent: "StartChat".to_string(),
                context: serde_json::json!({"type": "fdc3.contact"}),
                app: Some(Harness::targeted_ref(&target)),
            },
        )
        .await
        .unwrap();
    let ResponsePayload::RaiseIntent { intent_resolution: Some(_), .. } = response else {
        panic!("expected a successful raiseIntentResponse");
    };

    let private_channel = harness.root.channels.create_private_channel(target.clone());

    let before = harness
        .route(
            &source,
            RequestPayload::Broadcast { channel_id: private_channel.id.clone(), context: serde_json::json!({"type": "fdc3.contact"}) },
        )
        .await
        .unwrap();
    assert!(matches!(before, ResponsePayload::Broadcast { error: Some(WireError::AccessDenied) }));

    // The target's `intentResultRequest` would name this private channel;
    // exercise the grant `dispatch::route` applies for that shape directly.
    harness.root.channels.grant_private_access(&private_channel.id, source.clone());

    let after = harness
        .route(
            &source,
            RequestPayload::Broadcast { channel_id: private_channel.id.clone(), context: serde_json::json!({"type": "fdc3.contact"}) },
        )
        .await
        .unwrap();
    assert!(matches!(after, ResponsePayload::Broadcast { error: None }));
}

struct FakeOpenStrategy {
    attempt: ConnectionAttemptId,
}

#[async_trait]
impl OpenApplicationStrategy for FakeOpenStrategy {
    fn can_open(&self, _descriptor: &OpenRequestDescriptor) -> bool {
        true
    }

    async fn open(&self, _descriptor: &OpenRequestDescriptor) -> Result<ConnectionAttemptId, OpenStrategyError> {
        Ok(self.attempt.clone())
    }
}

fn grid_app_record() -> AppRecord {
    AppRecord {
        app_id: "grid".to_string(),
        name: Some("Grid".to_string()),
        details: AppDetails::Web { url: "https://grid.example.com".to_string() },
        intents: BTreeMap::new(),
    }
}

/// Opening an app with a context waits for the new instance's context
/// listener before handing off the context, then answers `openResponse`.
#[tokio::test]
async fn open_with_context_hands_off_after_listener_registers() {
    let attempt = ConnectionAttemptId::new("attempt-1");
    let directory = AppDirectory::new(
        vec!["https://dir.example.com".to_string()],
        Arc::new(StaticDirectoryClient(vec![grid_app_record()])),
        Arc::new(NoUiAppResolver),
    );
    let channels = ChannelEngine::new(Vec::new());
    let intents = IntentEngine::new();
    let strategy: Arc<dyn OpenApplicationStrategy> = Arc::new(FakeOpenStrategy { attempt: attempt.clone() });
    let open = OpenOrchestrator::new(vec![strategy]);
    let events = EventListenerRegistry::new();
    let heartbeats = HeartbeatRegistry::new(Duration::from_secs(60), 3, CancellationToken::new());
    let connections = ConnectionRegistry::new();
    let transport: Arc<dyn Transport> = Arc::new(NullTransport);
    let gateway = Arc::new(RecordingGateway::default());

    let root = Root::new(
        directory,
        channels,
        intents,
        open,
        events,
        heartbeats,
        connections,
        transport,
        gateway.clone() as Arc<dyn OutboundGateway>,
        Arc::new(FixedClock("2026-07-31T00:00:00Z".to_string())),
        Duration::from_millis(500),
        Duration::from_millis(500),
        None,
        CancellationToken::new(),
    );

    let (source, _) = root.directory.register_new_instance("chat", None).await.unwrap();
    root.connections.bind(source.clone(), ChannelId::new("chan-chat"));

    let open_root = root.clone();
    let open_source = source.clone();
    let open_task = tokio::spawn(async move {
        open_root
            .route(
                open_source,
                RequestUuid::new("req-open"),
                RequestPayload::Open {
                    app: AppIdentifierRef { app_id: "grid".to_string(), instance_id: None },
                    context: Some(serde_json::json!({"type": "fdc3.contact"})),
                },
            )
            .await
    });

    // Give `handle_open` time to launch the strategy and start awaiting
    // the new instance's identity before it validates.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let new_identifier = FullyQualifiedAppIdentifier::new(root.directory.qualify("grid"), InstanceId::new("new-inst"));
    root.connections.bind(new_identifier.clone(), ChannelId::new("chan-grid-new"));
    assert!(root.open.resolve_identity(&attempt, new_identifier.clone()));

    tokio::time::sleep(Duration::from_millis(20)).await;
    root.route(
        new_identifier.clone(),
        RequestUuid::new("req-listener"),
        RequestPayload::AddContextListener { channel_id: None, context_type: Some("fdc3.contact".to_string()) },
    )
    .await
    .unwrap();

    let response = tokio::time::timeout(Duration::from_secs(1), open_task)
        .await
        .expect("open should complete once the new instance's listener registers")
        .unwrap();

    match response {
        ResponsePayload::Open { app_identifier: Some(identifier), error: None } => {
            assert_eq!(identifier, new_identifier);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    let channel_id = root.connections.channel_for(&new_identifier).unwrap();
    let delivered: Vec<_> =
        gateway.events.lock().unwrap().iter().filter(|(c, _)| *c == channel_id).map(|(_, e)| e.payload.clone()).collect();
    assert!(delivered.iter().any(|e| matches!(e, EventPayload::Broadcast { channel_id: None, .. })));
}
