//! Common utility functions shared across the interop root crates.
//!
//! This crate sits at the shared-kernel layer alongside `interop-types`.
//!
//! # Design Principles
//!
//! - **Pure functions only** - no side effects, no I/O
//! - **Minimal dependencies** - only chrono for timestamp utilities
//! - **No domain types** - utilities should not import from interop-domain

pub mod string;
pub mod timestamp;

pub use string::{none_if_empty, StringExt};
pub use timestamp::now_rfc3339;
