//! Interop Root Adapters: the one reference implementation shipped for
//! each outbound port in `interop-ports` (§1 "Out of scope: ... consumed
//! via a narrow ... trait"). `interop-composition` wires these into a
//! `Root`; nothing here is reachable from `interop-domain` or
//! `interop-root` directly.

pub mod directory_client;
pub mod gateway;
pub mod open_strategy;
pub mod websocket;

pub use directory_client::ReqwestDirectoryClient;
pub use gateway::WebSocketGateway;
pub use open_strategy::WebOpenStrategy;
pub use websocket::{router, WebSocketTransport};
