//! The composition root (§9): turns a [`RootConfig`] plus the
//! code-configured collaborators (`openStrategies`, `uiProvider`, §6) into
//! a fully wired [`Root`] and the WebSocket router that serves it.

use crate::RootConfig;
use interop_adapters::{ReqwestDirectoryClient, WebOpenStrategy, WebSocketGateway, WebSocketTransport};
use interop_domain::{
    channel::default_user_channels, AppDirectory, ChannelEngine, ConnectionRegistry, EventListenerRegistry,
    HeartbeatRegistry, IntentEngine, OpenOrchestrator,
};
use interop_ports::{
    AppResolver, ClockPort, InboundHandler, NoUiAppResolver, OpenApplicationStrategy, OutboundGateway, SystemClock,
    Transport, DEFAULT_CONTEXT_HANDOFF_TIMEOUT, DEFAULT_IDENTITY_TIMEOUT,
};
use interop_root::Root;
use interop_types::Channel;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything `interop-runner` needs to start serving: the wired
/// coordinator plus the transport whose router it mounts.
pub struct WiredRoot {
    pub root: Arc<Root>,
    pub transport: Arc<WebSocketTransport>,
}

/// Code-configured collaborators the source's root constructor takes
/// alongside its environment-driven options (§6 `openStrategies`,
/// `uiProvider`). Defaults to the built-in web strategy only and the
/// auto-selecting no-UI resolver, matching a deployment with no ambiguous
/// resolution surface configured.
pub struct Collaborators {
    pub resolver: Arc<dyn AppResolver>,
    /// Tried in order before the built-in web fallback (§4.F step 3),
    /// which composition always appends last.
    pub open_strategies: Vec<Arc<dyn OpenApplicationStrategy>>,
    /// Pre-declared user channels (§4.D); defaults to the reference
    /// eight-color FDC3-style set.
    pub default_user_channels: Vec<Channel>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            resolver: Arc::new(NoUiAppResolver),
            open_strategies: Vec::new(),
            default_user_channels: default_user_channels(),
        }
    }
}

/// Build every domain engine, the reference adapters, and the `Root` that
/// binds them, then register the root as the transport's sole inbound
/// handler.
pub fn build_root(config: &RootConfig, collaborators: Collaborators, shutdown: CancellationToken) -> WiredRoot {
    let Collaborators { resolver, mut open_strategies, default_user_channels } = collaborators;

    let directory_client = Arc::new(ReqwestDirectoryClient::default());
    let directory = AppDirectory::new(config.app_directory_urls.clone(), directory_client, resolver);

    let channels = ChannelEngine::new(default_user_channels);
    let intents = IntentEngine::new();

    open_strategies.push(Arc::new(WebOpenStrategy));
    let open = OpenOrchestrator::new(open_strategies);

    let events = EventListenerRegistry::new();
    let heartbeats = HeartbeatRegistry::new(config.heartbeat_interval, config.heartbeat_max_misses, shutdown.clone());
    let connections = ConnectionRegistry::new();

    let transport = Arc::new(WebSocketTransport::new());
    let gateway: Arc<dyn OutboundGateway> = Arc::new(WebSocketGateway::new(transport.clone() as Arc<dyn Transport>));
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);

    let root = Root::new(
        directory,
        channels,
        intents,
        open,
        events,
        heartbeats,
        connections,
        transport.clone() as Arc<dyn Transport>,
        gateway,
        clock,
        DEFAULT_IDENTITY_TIMEOUT,
        DEFAULT_CONTEXT_HANDOFF_TIMEOUT,
        config.identity_url.clone(),
        shutdown,
    );

    transport.subscribe(root.clone() as Arc<dyn InboundHandler>);

    WiredRoot { root, transport }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config() -> RootConfig {
        RootConfig {
            app_directory_urls: Vec::new(),
            identity_url: None,
            backoff_max_attempts: 5,
            backoff_base_delay: Duration::from_millis(250),
            server_addr: "127.0.0.1:0".to_string(),
            heartbeat_interval: Duration::from_millis(50),
            heartbeat_max_misses: 3,
        }
    }

    #[tokio::test]
    async fn build_root_wires_the_transport_as_the_roots_own_handler() {
        let wired = build_root(&test_config(), Collaborators::default(), CancellationToken::new());
        // The root identifies itself under a fixed sentinel identity and
        // never registers as a live instance (§4.H).
        assert_eq!(Root::identity().app_id.as_str(), "interop-root@root");
        let _ = wired.transport;
    }
}
