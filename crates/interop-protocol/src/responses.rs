//! `Response` payloads: root -> proxy, one per request (except
//! `heartbeatAcknowledgementRequest`, which gets none) plus
//! `raiseIntentResultResponse`, which is emitted asynchronously once the
//! target returns a result (§4.E `onIntentResult`) but still echoes the
//! *original* `raiseIntentRequest`'s `requestUuid`.
//!
//! Errors are carried as a value (`error: Option<WireError>`) alongside the
//! success fields rather than as a separate Err variant, per §7 ("errors are
//! values carried in response payloads, not exceptional control flow").

use interop_types::{Channel, Context, FullyQualifiedAppIdentifier, ListenerId, WireError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An app as returned from directory queries: the static record plus its
/// currently live instances, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadataWire {
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
}

/// `{intent, apps}` as returned by `getAppIntent`/`getAppIntentsForContext`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIntentWire {
    pub intent: String,
    pub apps: Vec<AppMetadataWire>,
}

/// `{source, intent}` as returned by a successful `raiseIntentRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResolutionWire {
    pub source: FullyQualifiedAppIdentifier,
    pub intent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ResponsePayload {
    #[serde(rename = "findInstancesResponse")]
    FindInstances {
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        instances: Vec<FullyQualifiedAppIdentifier>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "getAppMetadataResponse")]
    GetAppMetadata {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        app: Option<AppMetadataWire>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "getAppDirectoryApplicationResponse")]
    GetAppDirectoryApplication {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        application: Option<interop_types::AppRecord>,
    },

    #[serde(rename = "findIntentResponse")]
    FindIntent {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        app_intent: Option<AppIntentWire>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "findIntentsByContextResponse")]
    FindIntentsByContext {
        #[serde(default)]
        app_intents: Vec<AppIntentWire>,
    },

    #[serde(rename = "getContextForAppIntentResponse")]
    GetContextForAppIntent {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        contexts: Option<Vec<String>>,
    },

    #[serde(rename = "addIntentListenerResponse")]
    AddIntentListener {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        listener_uuid: Option<ListenerId>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "intentListenerUnsubscribeResponse")]
    IntentListenerUnsubscribe {},

    #[serde(rename = "raiseIntentResponse")]
    RaiseIntent {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        intent_resolution: Option<IntentResolutionWire>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "raiseIntentForContextResponse")]
    RaiseIntentForContext {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        intent_resolution: Option<IntentResolutionWire>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    /// Acknowledges `intentResultRequest` from the target (§4.E
    /// `onIntentResult` step 1); always empty, never an error.
    #[serde(rename = "intentResultResponse")]
    IntentResult {},

    /// Emitted asynchronously to the *originator* once the target's result
    /// has been decoded and routed (§4.E `onIntentResult` step 4); its
    /// envelope `meta.requestUuid` echoes the original `raiseIntentRequest`.
    #[serde(rename = "raiseIntentResultResponse")]
    RaiseIntentResult {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        intent_result: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "openResponse")]
    Open {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        app_identifier: Option<FullyQualifiedAppIdentifier>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "getOrCreateChannelResponse")]
    GetOrCreateChannel {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        channel: Option<Channel>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "createPrivateChannelResponse")]
    CreatePrivateChannel { channel: Channel },

    #[serde(rename = "broadcastResponse")]
    Broadcast {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "addContextListenerResponse")]
    AddContextListener {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        listener_uuid: Option<ListenerId>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "getCurrentContextResponse")]
    GetCurrentContext {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        context: Option<Context>,
    },

    #[serde(rename = "joinUserChannelResponse")]
    JoinUserChannel {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "getUserChannelsResponse")]
    GetUserChannels { channels: Vec<Channel> },

    #[serde(rename = "leaveCurrentChannelResponse")]
    LeaveCurrentChannel {},

    #[serde(rename = "unsubscribeResponse")]
    Unsubscribe {},

    #[serde(rename = "addEventListenerResponse")]
    AddEventListener {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        listener_uuid: Option<ListenerId>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<WireError>,
    },

    #[serde(rename = "removeEventListenerResponse")]
    RemoveEventListener {},
}

impl ResponsePayload {
    /// The wire `type` tag this variant serializes under, e.g.
    /// `"raiseIntentResponse"`. Used in tests and logging without round
    /// tripping through JSON.
    pub fn type_tag(&self) -> &'static str {
        match self {
            ResponsePayload::FindInstances { .. } => "findInstancesResponse",
            ResponsePayload::GetAppMetadata { .. } => "getAppMetadataResponse",
            ResponsePayload::GetAppDirectoryApplication { .. } => {
                "getAppDirectoryApplicationResponse"
            }
            ResponsePayload::FindIntent { .. } => "findIntentResponse",
            ResponsePayload::FindIntentsByContext { .. } => "findIntentsByContextResponse",
            ResponsePayload::GetContextForAppIntent { .. } => "getContextForAppIntentResponse",
            ResponsePayload::AddIntentListener { .. } => "addIntentListenerResponse",
            ResponsePayload::IntentListenerUnsubscribe {} => "intentListenerUnsubscribeResponse",
            ResponsePayload::RaiseIntent { .. } => "raiseIntentResponse",
            ResponsePayload::RaiseIntentForContext { .. } => "raiseIntentForContextResponse",
            ResponsePayload::IntentResult {} => "intentResultResponse",
            ResponsePayload::RaiseIntentResult { .. } => "raiseIntentResultResponse",
            ResponsePayload::Open { .. } => "openResponse",
            ResponsePayload::GetOrCreateChannel { .. } => "getOrCreateChannelResponse",
            ResponsePayload::CreatePrivateChannel { .. } => "createPrivateChannelResponse",
            ResponsePayload::Broadcast { .. } => "broadcastResponse",
            ResponsePayload::AddContextListener { .. } => "addContextListenerResponse",
            ResponsePayload::GetCurrentContext { .. } => "getCurrentContextResponse",
            ResponsePayload::JoinUserChannel { .. } => "joinUserChannelResponse",
            ResponsePayload::GetUserChannels { .. } => "getUserChannelsResponse",
            ResponsePayload::LeaveCurrentChannel {} => "leaveCurrentChannelResponse",
            ResponsePayload::Unsubscribe {} => "unsubscribeResponse",
            ResponsePayload::AddEventListener { .. } => "addEventListenerResponse",
            ResponsePayload::RemoveEventListener {} => "removeEventListenerResponse",
        }
    }
}
