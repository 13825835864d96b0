//! Interop Root: the request dispatcher binding the domain engines in
//! `interop-domain` to the wire protocol in `interop-protocol` (§4.I).
//! Everything here is transport-agnostic; `interop-adapters` supplies the
//! concrete `Transport`/`OutboundGateway`/`AppDirectoryClient`/
//! `OpenApplicationStrategy` implementations and `interop-composition`
//! wires them together.

mod dispatch;
mod handshake;
mod heartbeat_runtime;
mod inbound;
mod root;
mod root_api;
#[cfg(test)]
mod tests;

pub use root::Root;
