//! `RootConfig::from_env` (§6 "Configuration options"): mirrors the
//! teacher codebase's `AppConfig::from_env` — optional fields fall back to
//! sane defaults, fields with no sane default use `anyhow::Context` to
//! produce an actionable error instead of panicking.

use anyhow::{Context, Result};
use interop_ports::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_HEARTBEAT_MAX_MISSES};
use std::env;
use std::time::Duration;

/// Typed configuration for one root process, loaded from environment
/// variables (optionally via a local `.env` file, see `interop-runner`).
#[derive(Debug, Clone)]
pub struct RootConfig {
    /// `INTEROP_APP_DIRECTORY_URLS`, comma-separated. Empty means
    /// listener-only mode (§4.C "Loading policy").
    pub app_directory_urls: Vec<String>,
    /// `INTEROP_IDENTITY_URL`. Stored for configuration parity with the
    /// source constructor; not consulted by any operation in this
    /// rendering (see DESIGN.md).
    pub identity_url: Option<String>,
    /// `INTEROP_BACKOFF_MAX_ATTEMPTS` / `INTEROP_BACKOFF_BASE_DELAY_MS`:
    /// retry policy for the proxy's initial connection, which is an
    /// out-of-scope collaborator (§1) — carried here only so the
    /// configuration surface matches the source constructor.
    pub backoff_max_attempts: u32,
    pub backoff_base_delay: Duration,
    /// `INTEROP_SERVER_ADDR`: bind address for the reference WebSocket
    /// transport adapter.
    pub server_addr: String,
    /// `INTEROP_HEARTBEAT_INTERVAL_MS` / `INTEROP_HEARTBEAT_MAX_MISSES`
    /// (§4.H tuning).
    pub heartbeat_interval: Duration,
    pub heartbeat_max_misses: u32,
}

impl RootConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            app_directory_urls: env::var("INTEROP_APP_DIRECTORY_URLS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),

            identity_url: env::var("INTEROP_IDENTITY_URL").ok(),

            backoff_max_attempts: env::var("INTEROP_BACKOFF_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("INTEROP_BACKOFF_MAX_ATTEMPTS must be a valid integer")?,

            backoff_base_delay: Duration::from_millis(
                env::var("INTEROP_BACKOFF_BASE_DELAY_MS")
                    .unwrap_or_else(|_| "250".to_string())
                    .parse()
                    .context("INTEROP_BACKOFF_BASE_DELAY_MS must be a valid integer")?,
            ),

            server_addr: env::var("INTEROP_SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:7070".to_string()),

            heartbeat_interval: Duration::from_millis(
                env::var("INTEROP_HEARTBEAT_INTERVAL_MS")
                    .unwrap_or_else(|_| DEFAULT_HEARTBEAT_INTERVAL.as_millis().to_string())
                    .parse()
                    .context("INTEROP_HEARTBEAT_INTERVAL_MS must be a valid integer")?,
            ),

            heartbeat_max_misses: env::var("INTEROP_HEARTBEAT_MAX_MISSES")
                .unwrap_or_else(|_| DEFAULT_HEARTBEAT_MAX_MISSES.to_string())
                .parse()
                .context("INTEROP_HEARTBEAT_MAX_MISSES must be a valid integer")?,
        })
    }
}
