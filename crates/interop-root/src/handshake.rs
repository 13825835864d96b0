//! WCP handshake state machine (§4.A): `WCP1Hello` -> `WCP3Handshake` ->
//! `WCP4ValidateAppIdentity` -> `WCP5ValidateAppIdentitySuccessResponse` /
//! `WCP5ValidateAppIdentityFailedResponse`.

use crate::root::Root;
use interop_protocol::{
    Wcp1Hello, Wcp3Handshake, Wcp4ValidateAppIdentity, Wcp5ValidateAppIdentityFailedResponse,
    Wcp5ValidateAppIdentitySuccessResponse,
};
use interop_types::{AppId, InstanceId};

impl Root {
    /// Step 1-2: a freshly connected channel announces itself. We mint a
    /// `connectionAttemptUuid` and park it until `WCP4ValidateAppIdentity`
    /// arrives on the same channel.
    pub(crate) fn handle_hello(&self, channel_id: interop_types::ChannelId, hello: Wcp1Hello) -> Wcp3Handshake {
        self.pending_hello.insert(channel_id, hello.connection_attempt_uuid.clone());
        Wcp3Handshake {
            connection_attempt_uuid: hello.connection_attempt_uuid,
            fdc3_version: hello.fdc3_version,
            channel_selector_url: None,
            intent_resolver_url: None,
        }
    }

    /// Step 4: the app echoes back its identity. Two paths converge here:
    /// a freshly opened app completing its very first handshake (no prior
    /// `registerNewInstance` call, §4.A "new connection") and an app the
    /// root itself launched via `open.launch` (§4.F step 2) whose attempt
    /// id was already resolved by `OpenOrchestrator::resolve_identity`.
    pub(crate) async fn handle_validate_identity(
        &self,
        channel_id: interop_types::ChannelId,
        msg: Wcp4ValidateAppIdentity,
    ) -> Result<Wcp5ValidateAppIdentitySuccessResponse, Wcp5ValidateAppIdentityFailedResponse> {
        let requested_instance = msg.instance_id.clone();
        let registration = self
            .directory
            .register_new_instance(&msg.identity_url, requested_instance)
            .await;

        let (identifier, _record) = match registration {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(identity_url = %msg.identity_url, error = %err, "validateAppIdentity failed");
                return Err(Wcp5ValidateAppIdentityFailedResponse {
                    connection_attempt_uuid: msg.connection_attempt_uuid,
                    message: err.to_string(),
                });
            }
        };

        self.pending_hello.remove(&channel_id);
        self.connections.bind(identifier.clone(), channel_id);

        self.open.resolve_identity(&msg.connection_attempt_uuid, identifier.clone());

        Ok(Wcp5ValidateAppIdentitySuccessResponse::new(
            AppId::new(identifier.app_id.local().as_str()),
            instance_id(&identifier),
        ))
    }
}

fn instance_id(identifier: &interop_types::FullyQualifiedAppIdentifier) -> InstanceId {
    identifier.instance_id.clone()
}
