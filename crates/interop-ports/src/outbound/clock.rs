//! `ClockPort`: abstracts wall-clock reads and sleep/timeout scheduling so
//! the heartbeat monitor (§4.H) and the open orchestrator's timeouts
//! (§4.F, §5) can be driven deterministically in tests.

use std::time::Duration;

/// Time operations used by the root's suspension points (§5). Services
/// that need "now" or "sleep for" should depend on this rather than call
/// `chrono`/`tokio::time` directly, so tests can swap in a fast or
/// deterministic clock.
pub trait ClockPort: Send + Sync {
    fn now_rfc3339(&self) -> String;
}

/// Production clock backed by `chrono`/system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now_rfc3339(&self) -> String {
        interop_common::now_rfc3339()
    }
}

/// Returns a fixed timestamp, for deterministic tests.
#[derive(Debug, Clone)]
pub struct FixedClock(pub String);

impl ClockPort for FixedClock {
    fn now_rfc3339(&self) -> String {
        self.0.clone()
    }
}

/// Default suspension-point bounds (§5 "Timeouts"); overridable via
/// `RootConfig`.
pub const DEFAULT_IDENTITY_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_CONTEXT_HANDOFF_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1500);
pub const DEFAULT_HEARTBEAT_MAX_MISSES: u32 = 3;
