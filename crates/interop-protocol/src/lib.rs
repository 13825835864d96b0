//! Interop Root Protocol - wire envelope types for root/proxy communication.
//!
//! Built on `interop-types`'s vocabulary. Nothing here depends on
//! `interop-domain`; conversions between domain-level results and these
//! wire shapes live in `interop-root`, the layer that actually runs the
//! dispatcher (§4.I).

pub mod envelope;
pub mod events;
pub mod handshake;
pub mod meta;
pub mod requests;
pub mod responses;

pub use envelope::{Envelope, EventEnvelope, RequestEnvelope, ResponseEnvelope};
pub use events::EventPayload;
pub use handshake::{
    Wcp1Hello, Wcp3Handshake, Wcp4ValidateAppIdentity, Wcp5ValidateAppIdentityFailedResponse,
    Wcp5ValidateAppIdentitySuccessResponse,
};
pub use meta::{EventMeta, RequestMeta, ResponseMeta};
pub use requests::{AppIdentifierRef, RequestPayload};
pub use responses::{AppIntentWire, AppMetadataWire, IntentResolutionWire, ResponsePayload};
