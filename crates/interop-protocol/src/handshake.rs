//! The four-step connection-establishment handshake (§4.A).
//!
//! These envelopes travel outside the `Request`/`Response`/`Event` sum: they
//! are exchanged before the proxy has been assigned a `ChannelId`, so they
//! cannot yet carry a `FullyQualifiedAppIdentifier` as their `source`.

use interop_types::{AppId, ConnectionAttemptId, InstanceId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Step 1: proxy -> root, on the out-of-band discovery medium (in this
/// rendering: the first frame of the WebSocket connection itself, since a
/// native process has no frame tree to `postMessage` up).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wcp1Hello {
    pub connection_attempt_uuid: ConnectionAttemptId,
    pub fdc3_version: String,
    pub identity_url: String,
    pub actual_url: String,
}

/// Step 2: root -> proxy, acknowledging discovery and handing over the
/// dedicated transport endpoint's coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wcp3Handshake {
    pub connection_attempt_uuid: ConnectionAttemptId,
    pub fdc3_version: String,
    pub channel_selector_url: Option<String>,
    pub intent_resolver_url: Option<String>,
}

/// Step 3: proxy -> root, over the freshly assigned transport endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wcp4ValidateAppIdentity {
    pub connection_attempt_uuid: ConnectionAttemptId,
    pub identity_url: String,
    pub actual_url: String,
    #[serde(default)]
    pub instance_id: Option<InstanceId>,
    #[serde(default)]
    pub instance_uuid: Option<String>,
}

/// Step 4, success case: root -> proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wcp5ValidateAppIdentitySuccessResponse {
    pub app_id: AppId,
    pub instance_id: InstanceId,
    pub instance_uuid: String,
}

/// Step 4, failure case: the identity URL did not resolve against the
/// directory. The root discards the ChannelId and stops processing this
/// connection after sending this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wcp5ValidateAppIdentityFailedResponse {
    pub connection_attempt_uuid: ConnectionAttemptId,
    pub message: String,
}

impl Wcp5ValidateAppIdentitySuccessResponse {
    pub fn new(app_id: AppId, instance_id: InstanceId) -> Self {
        Self {
            app_id,
            instance_id,
            instance_uuid: Uuid::new_v4().to_string(),
        }
    }
}
