//! Interop Root Ports - trait boundaries between the root coordinator and
//! its collaborators (§1 "Out of scope (external collaborators)").
//!
//! `outbound` traits are implemented by adapters and depended on by the
//! root/domain layers; `inbound` traits are implemented by the root and
//! depended on by in-process callers (the self-dispatch short-circuit,
//! §9).

pub mod inbound;
pub mod outbound;

pub use inbound::RootApi;
pub use outbound::{
    AppDirectoryClient, AppResolver, ClockPort, ContextCandidate, DirectoryFetchError,
    FixedClock, InboundHandler, IntentCandidate, NoUiAppResolver, OpenApplicationStrategy,
    OpenRequestDescriptor, OpenStrategyError, OutboundGateway, ResolverError, SystemClock,
    Transport, TransportError, DEFAULT_CONTEXT_HANDOFF_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_HEARTBEAT_MAX_MISSES, DEFAULT_IDENTITY_TIMEOUT,
};
