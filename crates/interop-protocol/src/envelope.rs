//! The three top-level message shapes (§3 "Messages"): `Request`,
//! `Response`, and `Event`. Each is `{type, meta, payload}` on the wire,
//! with `type`/`payload` contributed by the adjacently-tagged payload enum
//! and `meta` flattened in alongside it.

use crate::events::EventPayload;
use crate::meta::{EventMeta, RequestMeta, ResponseMeta};
use crate::requests::RequestPayload;
use crate::responses::ResponsePayload;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(flatten)]
    pub payload: RequestPayload,
    pub meta: RequestMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(flatten)]
    pub payload: ResponsePayload,
    pub meta: ResponseMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(flatten)]
    pub payload: EventPayload,
    pub meta: EventMeta,
}

/// Any message a proxy's transport channel may carry in either direction.
/// Inbound frames are always `Request`; outbound frames are `Response` or
/// `Event`. Kept as one sum so a single decode step at the transport
/// boundary can dispatch on shape before the root dispatcher inspects
/// `type` (§4.I).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Request(RequestEnvelope),
    Response(ResponseEnvelope),
    Event(EventEnvelope),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::AppIdentifierRef;
    use interop_types::{AppId, FullyQualifiedAppId, FullyQualifiedAppIdentifier, InstanceId, RequestUuid};
    use serde_json::json;

    fn source() -> FullyQualifiedAppIdentifier {
        FullyQualifiedAppIdentifier::new(
            FullyQualifiedAppId::new(&AppId::new("chat"), "dir.example.com"),
            InstanceId::new("inst-1"),
        )
    }

    #[test]
    fn request_envelope_serializes_type_meta_and_payload_as_siblings() {
        let envelope = RequestEnvelope {
            payload: RequestPayload::FindInstances {
                app: AppIdentifierRef {
                    app_id: "ghost@dir".to_string(),
                    instance_id: None,
                },
            },
            meta: RequestMeta {
                request_uuid: RequestUuid::new("req-1"),
                timestamp: "2026-07-28T00:00:00Z".to_string(),
                source: source(),
            },
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "findInstancesRequest");
        assert!(json.get("payload").is_some());
        assert!(json.get("meta").is_some());
        assert_eq!(json["meta"]["requestUuid"], "req-1");
    }

    #[test]
    fn envelope_untagged_decode_picks_request_shape() {
        let value = json!({
            "type": "leaveCurrentChannelRequest",
            "payload": null,
            "meta": {
                "requestUuid": "req-2",
                "timestamp": "2026-07-28T00:00:00Z",
                "source": {"appId": "chat@dir", "instanceId": "inst-1"},
            }
        });
        let envelope: Envelope = serde_json::from_value(value).unwrap();
        assert!(matches!(envelope, Envelope::Request(_)));
    }
}
