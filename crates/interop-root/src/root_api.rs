//! `RootApi` (§9): the in-process self-dispatch short-circuit. Shares
//! `route` with the transport path but skips envelope wrapping and
//! heartbeat bookkeeping, neither of which apply to a caller that isn't a
//! connected proxy.

use crate::root::Root;
use async_trait::async_trait;
use interop_protocol::{RequestPayload, ResponsePayload};
use interop_ports::RootApi;
use interop_types::{FullyQualifiedAppIdentifier, RequestUuid};

#[async_trait]
impl RootApi for Root {
    async fn dispatch(&self, source: FullyQualifiedAppIdentifier, request: RequestPayload) -> Option<ResponsePayload> {
        let request_uuid = RequestUuid::new(uuid::Uuid::new_v4().to_string());
        self.route(source, request_uuid, request).await
    }
}
