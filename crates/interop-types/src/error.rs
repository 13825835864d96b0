//! The closed error taxonomy surfaced in response payloads as `{error: ...}`.
//!
//! Per-module `thiserror` enums elsewhere in this workspace (directory,
//! channel engine, intent engine, open orchestrator) implement
//! [`ToWireError`] to map their internal variants onto this closed set
//! rather than leaking internal detail onto the wire.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireError {
    // Resolution
    NoAppsFound,
    TargetAppUnavailable,
    TargetInstanceUnavailable,
    UserCancelled,
    IntentDeliveryFailed,
    MalformedContext,
    // Open
    AppNotFound,
    ErrorOnLaunch,
    AppTimeout,
    ResolverUnavailable,
    // Channel
    NoChannelFound,
    CreationFailed,
    AccessDenied,
}

impl WireError {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireError::NoAppsFound => "NoAppsFound",
            WireError::TargetAppUnavailable => "TargetAppUnavailable",
            WireError::TargetInstanceUnavailable => "TargetInstanceUnavailable",
            WireError::UserCancelled => "UserCancelled",
            WireError::IntentDeliveryFailed => "IntentDeliveryFailed",
            WireError::MalformedContext => "MalformedContext",
            WireError::AppNotFound => "AppNotFound",
            WireError::ErrorOnLaunch => "ErrorOnLaunch",
            WireError::AppTimeout => "AppTimeout",
            WireError::ResolverUnavailable => "ResolverUnavailable",
            WireError::NoChannelFound => "NoChannelFound",
            WireError::CreationFailed => "CreationFailed",
            WireError::AccessDenied => "AccessDenied",
        }
    }
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Implemented by every port-boundary error enum so handlers can map
/// collaborator failures onto the closed wire taxonomy (§7).
pub trait ToWireError {
    fn to_wire_error(&self) -> WireError;
}
