//! Envelope metadata shared by the three top-level message shapes.

use interop_types::{FullyQualifiedAppIdentifier, RequestUuid};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
    pub request_uuid: RequestUuid,
    pub timestamp: String,
    pub source: FullyQualifiedAppIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Echoes the request's `requestUuid` exactly.
    pub request_uuid: RequestUuid,
    pub response_uuid: String,
    pub timestamp: String,
    pub source: FullyQualifiedAppIdentifier,
}

impl ResponseMeta {
    /// Build response meta that echoes `request_uuid`, minting a fresh
    /// `responseUuid` (§4.B).
    pub fn reply_to(
        request_uuid: RequestUuid,
        source: FullyQualifiedAppIdentifier,
        timestamp: String,
    ) -> Self {
        Self {
            request_uuid,
            response_uuid: Uuid::new_v4().to_string(),
            timestamp,
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    pub event_uuid: String,
    pub timestamp: String,
}

impl EventMeta {
    pub fn new(timestamp: String) -> Self {
        Self {
            event_uuid: Uuid::new_v4().to_string(),
            timestamp,
        }
    }
}
