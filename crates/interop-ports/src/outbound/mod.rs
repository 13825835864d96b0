//! Outbound ports: traits implemented by adapters, depended on by the root.

mod app_resolver;
mod clock;
mod directory_client;
mod gateway;
mod open_strategy;
mod transport;

pub use app_resolver::{AppResolver, ContextCandidate, IntentCandidate, NoUiAppResolver, ResolverError};
pub use clock::{
    ClockPort, FixedClock, SystemClock, DEFAULT_CONTEXT_HANDOFF_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_HEARTBEAT_MAX_MISSES, DEFAULT_IDENTITY_TIMEOUT,
};
pub use directory_client::{AppDirectoryClient, DirectoryFetchError};
pub use gateway::OutboundGateway;
pub use open_strategy::{OpenApplicationStrategy, OpenRequestDescriptor, OpenStrategyError};
pub use transport::{InboundHandler, Transport, TransportError};

#[cfg(any(test, feature = "testing"))]
pub use app_resolver::MockAppResolver;
#[cfg(any(test, feature = "testing"))]
pub use directory_client::MockAppDirectoryClient;
#[cfg(any(test, feature = "testing"))]
pub use gateway::MockOutboundGateway;
#[cfg(any(test, feature = "testing"))]
pub use open_strategy::MockOpenApplicationStrategy;
#[cfg(any(test, feature = "testing"))]
pub use transport::MockTransport;
