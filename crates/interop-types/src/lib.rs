//! Interop Root Types - the innermost vocabulary layer.
//!
//! These are the shared nouns of the system: opaque identifiers, the
//! `Context` and `Channel` wire vocabulary, the static `AppRecord` catalog
//! shape, and the closed wire error taxonomy. Nothing here depends on
//! `interop-protocol` or `interop-domain` — it is the layer they both build
//! on.

pub mod app_record;
pub mod channel;
pub mod context;
pub mod error;
pub mod ids;

pub use app_record::{AppDetails, AppRecord, IntentDeclaration};
pub use channel::{Channel, ChannelType, DisplayMetadata};
pub use context::{Context, ContextValidationError};
pub use error::{ToWireError, WireError};
pub use ids::{
    AppId, ChannelId, ConnectionAttemptId, FullyQualifiedAppId, FullyQualifiedAppIdentifier,
    InstanceId, ListenerId, RequestUuid, UNKNOWN_APP_DIRECTORY_HOST,
};
