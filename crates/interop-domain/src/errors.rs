//! Per-module error enums (§7). Each implements [`ToWireError`] to map onto
//! the closed wire taxonomy (§6) rather than leaking internal detail.

use interop_types::{ToWireError, WireError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("no apps found")]
    NoAppsFound,
    #[error("target app is unavailable")]
    TargetAppUnavailable,
    #[error("target instance is unavailable")]
    TargetInstanceUnavailable,
    #[error("user cancelled app resolution")]
    UserCancelled,
    #[error("context payload is malformed")]
    MalformedContext,
    #[error("app not found")]
    AppNotFound,
}

impl ToWireError for DirectoryError {
    fn to_wire_error(&self) -> WireError {
        match self {
            DirectoryError::NoAppsFound => WireError::NoAppsFound,
            DirectoryError::TargetAppUnavailable => WireError::TargetAppUnavailable,
            DirectoryError::TargetInstanceUnavailable => WireError::TargetInstanceUnavailable,
            DirectoryError::UserCancelled => WireError::UserCancelled,
            DirectoryError::MalformedContext => WireError::MalformedContext,
            DirectoryError::AppNotFound => WireError::AppNotFound,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntentError {
    #[error("context payload is malformed")]
    MalformedContext,
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("intent could not be delivered")]
    IntentDeliveryFailed,
}

impl ToWireError for IntentError {
    fn to_wire_error(&self) -> WireError {
        match self {
            IntentError::MalformedContext => WireError::MalformedContext,
            IntentError::Directory(inner) => inner.to_wire_error(),
            IntentError::IntentDeliveryFailed => WireError::IntentDeliveryFailed,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OpenError {
    #[error("app not found")]
    AppNotFound,
    #[error("context payload is malformed")]
    MalformedContext,
    #[error("launch failed: {0}")]
    ErrorOnLaunch(String),
    #[error("timed out waiting for the app to launch")]
    AppTimeout,
    #[error("resolver is unavailable")]
    ResolverUnavailable,
}

impl ToWireError for OpenError {
    fn to_wire_error(&self) -> WireError {
        match self {
            OpenError::AppNotFound => WireError::AppNotFound,
            OpenError::MalformedContext => WireError::MalformedContext,
            OpenError::ErrorOnLaunch(_) => WireError::ErrorOnLaunch,
            OpenError::AppTimeout => WireError::AppTimeout,
            OpenError::ResolverUnavailable => WireError::ResolverUnavailable,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("no channel found")]
    NoChannelFound,
    #[error("channel creation failed")]
    CreationFailed,
    #[error("access denied")]
    AccessDenied,
    #[error("context payload is malformed")]
    MalformedContext,
}

impl ToWireError for ChannelError {
    fn to_wire_error(&self) -> WireError {
        match self {
            ChannelError::NoChannelFound => WireError::NoChannelFound,
            ChannelError::CreationFailed => WireError::CreationFailed,
            ChannelError::AccessDenied => WireError::AccessDenied,
            ChannelError::MalformedContext => WireError::MalformedContext,
        }
    }
}
