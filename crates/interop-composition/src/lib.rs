//! Interop Root Composition: wires a [`RootConfig`] and the
//! code-configured collaborators (§6) to the concrete adapters in
//! `interop-adapters`, producing a fully built [`Root`](interop_root::Root)
//! and its WebSocket router. `interop-runner` is the only crate that calls
//! into this one.

mod build;
mod config;

pub use build::{build_root, Collaborators, WiredRoot};
pub use config::RootConfig;
