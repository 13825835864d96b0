//! `Request` payloads: proxy -> root, one response envelope expected back
//! (except `heartbeatAcknowledgementRequest`, which is fire-and-forget).

use interop_types::{
    AppId, ChannelId, ConnectionAttemptId, FullyQualifiedAppId, FullyQualifiedAppIdentifier,
    ListenerId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An app reference as carried by requests that target one: either just an
/// id, or an id plus an instance to narrow to a single live connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIdentifierRef {
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RequestPayload {
    // --- App directory (§4.C) ---
    #[serde(rename = "findInstancesRequest")]
    FindInstances { app: AppIdentifierRef },

    #[serde(rename = "getAppMetadataRequest")]
    GetAppMetadata { app: AppIdentifierRef },

    #[serde(rename = "getAppDirectoryApplicationRequest")]
    GetAppDirectoryApplication { app_id: String },

    #[serde(rename = "findIntentRequest")]
    FindIntent {
        intent: String,
        #[serde(default)]
        context: Option<Value>,
        #[serde(default)]
        result_type: Option<String>,
    },

    #[serde(rename = "findIntentsByContextRequest")]
    FindIntentsByContext {
        context: Value,
        #[serde(default)]
        result_type: Option<String>,
    },

    #[serde(rename = "getContextForAppIntentRequest")]
    GetContextForAppIntent { app: AppIdentifierRef, intent: String },

    #[serde(rename = "addIntentListenerRequest")]
    AddIntentListener {
        intent: String,
        #[serde(default)]
        contexts: Vec<String>,
    },

    #[serde(rename = "intentListenerUnsubscribeRequest")]
    IntentListenerUnsubscribe { listener_uuid: ListenerId },

    // --- Intent engine (§4.E) ---
    #[serde(rename = "raiseIntentRequest")]
    RaiseIntent {
        intent: String,
        context: Value,
        #[serde(default)]
        app: Option<AppIdentifierRef>,
    },

    #[serde(rename = "raiseIntentForContextRequest")]
    RaiseIntentForContext {
        context: Value,
        #[serde(default)]
        app: Option<AppIdentifierRef>,
    },

    #[serde(rename = "intentResultRequest")]
    IntentResult {
        raise_intent_request_uuid: String,
        result: Value,
    },

    // --- Open/launch orchestrator (§4.F) ---
    #[serde(rename = "openRequest")]
    Open {
        app: AppIdentifierRef,
        #[serde(default)]
        context: Option<Value>,
    },

    /// Carried over the newly opened connection once it completes the
    /// handshake (§4.A); not itself an open-orchestrator request, but
    /// included here because it shares the `connectionAttemptUuid`
    /// correlation key the orchestrator awaits in §4.F step 5.
    #[serde(rename = "notifyContextRequest")]
    NotifyContext {
        connection_attempt_uuid: ConnectionAttemptId,
    },

    // --- Channel engine (§4.D) ---
    #[serde(rename = "getOrCreateChannelRequest")]
    GetOrCreateChannel { channel_id: ChannelId },

    #[serde(rename = "createPrivateChannelRequest")]
    CreatePrivateChannel,

    #[serde(rename = "broadcastRequest")]
    Broadcast {
        channel_id: ChannelId,
        context: Value,
    },

    #[serde(rename = "addContextListenerRequest")]
    AddContextListener {
        #[serde(default)]
        channel_id: Option<ChannelId>,
        #[serde(default)]
        context_type: Option<String>,
    },

    #[serde(rename = "getCurrentContextRequest")]
    GetCurrentContext {
        channel_id: ChannelId,
        #[serde(default)]
        context_type: Option<String>,
    },

    #[serde(rename = "joinUserChannelRequest")]
    JoinUserChannel { channel_id: ChannelId },

    #[serde(rename = "getUserChannelsRequest")]
    GetUserChannels,

    #[serde(rename = "leaveCurrentChannelRequest")]
    LeaveCurrentChannel,

    #[serde(rename = "unsubscribeRequest")]
    Unsubscribe { listener_uuid: ListenerId },

    // --- Event listener registry (§4.G) ---
    #[serde(rename = "addEventListenerRequest")]
    AddEventListener {
        #[serde(default)]
        event_type: Option<String>,
    },

    #[serde(rename = "removeEventListenerRequest")]
    RemoveEventListener { listener_uuid: ListenerId },

    // --- Heartbeat monitor (§4.H) ---
    #[serde(rename = "heartbeatAcknowledgementRequest")]
    HeartbeatAcknowledgement { heartbeat_event_uuid: String },
}

impl AppIdentifierRef {
    pub fn to_fully_qualified(&self, default_host: &str) -> FullyQualifiedAppId {
        FullyQualifiedAppId::parse_or_qualify(&self.app_id, default_host)
    }

    pub fn app_id(&self) -> AppId {
        AppId::new(self.app_id.as_str())
    }
}

impl From<&FullyQualifiedAppIdentifier> for AppIdentifierRef {
    fn from(value: &FullyQualifiedAppIdentifier) -> Self {
        Self {
            app_id: value.app_id.as_str().to_string(),
            instance_id: Some(value.instance_id.as_str().to_string()),
        }
    }
}
