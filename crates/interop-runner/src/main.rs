//! Interop Root - workspace interoperability bus coordinator.
//!
//! This crate is the composition root's entry point: it loads
//! configuration, wires the domain engines to the reference adapters, and
//! serves the WebSocket transport proxies connect to.

mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::run().await
}
