//! `RootApi` (§9 "Self-dispatch via the same message surface"): the
//! root-side short-circuit that delivers a request directly into the
//! dispatcher without crossing the transport. The root agent is itself a
//! producer of requests (e.g. the open orchestrator may want to query the
//! directory through the same surface proxies use); this trait is the seam
//! that lets it do so without the dispatcher depending on the transport
//! layer, and without an inheritance relationship between the two.

use async_trait::async_trait;
use interop_protocol::{RequestPayload, ResponsePayload};
use interop_types::FullyQualifiedAppIdentifier;

#[async_trait]
pub trait RootApi: Send + Sync {
    /// Dispatch `request` as if it had arrived from `source` over the
    /// transport. Returns `None` for fire-and-forget requests
    /// (`heartbeatAcknowledgementRequest`) or unknown request types (§4.I).
    async fn dispatch(
        &self,
        source: FullyQualifiedAppIdentifier,
        request: RequestPayload,
    ) -> Option<ResponsePayload>;
}
