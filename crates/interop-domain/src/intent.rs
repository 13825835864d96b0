//! The intent engine (§4.E): raise/resolve intents, the pending-intent
//! token, and suspension until a target registers a matching listener.

use crate::errors::IntentError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use dashmap::DashMap;
use interop_types::{Context, FullyQualifiedAppIdentifier, RequestUuid};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{oneshot, Notify};

/// The opaque pending-intent token handed to the target in `IntentEvent`
/// and echoed back verbatim in `intentResultRequest` (§4.E step 4). Encoded
/// as base64 JSON so it round-trips without a server-side side-table; §9
/// notes this is not tamper-proof, a real gap the source spec doesn't
/// address either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PendingIntentPayload {
    originator: FullyQualifiedAppIdentifier,
    original_request_uuid: RequestUuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingIntentToken(String);

impl PendingIntentToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn encode(originator: FullyQualifiedAppIdentifier, original_request_uuid: RequestUuid) -> Self {
        let payload = PendingIntentPayload {
            originator,
            original_request_uuid,
        };
        let json = serde_json::to_vec(&payload).expect("PendingIntentPayload always serializes");
        Self(STANDARD.encode(json))
    }

    pub fn decode(&self) -> Result<(FullyQualifiedAppIdentifier, RequestUuid), IntentError> {
        let bytes = STANDARD.decode(&self.0).map_err(|_| IntentError::IntentDeliveryFailed)?;
        let payload: PendingIntentPayload =
            serde_json::from_slice(&bytes).map_err(|_| IntentError::IntentDeliveryFailed)?;
        Ok((payload.originator, payload.original_request_uuid))
    }
}

impl From<String> for PendingIntentToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A raise awaiting the target's first listener registration for `(target,
/// intent)` (§4.E step 3, "there is no timeout here"). Resolved by a
/// `tokio::sync::Notify` broadcast every time `notify_listener_registered`
/// fires for a matching key — matching in-flight waiters re-check their
/// condition and proceed, the rest go back to sleep.
pub struct IntentEngine {
    listener_added: DashMap<(FullyQualifiedAppIdentifier, String), Arc<Notify>>,
    /// Pending raises awaiting their target's result, keyed by the token
    /// string so `onIntentResult` can resolve the right waiter even though
    /// many raises may target the same instance concurrently (§4.E
    /// "Concurrency").
    pending_results: DashMap<String, oneshot::Sender<Value>>,
    /// Which tokens are outstanding against a given target, so a disconnect
    /// cascade (§4.H) can fail every raise it owes a result for.
    pending_by_target: DashMap<FullyQualifiedAppIdentifier, Vec<String>>,
}

impl Default for IntentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentEngine {
    pub fn new() -> Self {
        Self {
            listener_added: DashMap::new(),
            pending_results: DashMap::new(),
            pending_by_target: DashMap::new(),
        }
    }

    fn notify_handle(&self, target: &FullyQualifiedAppIdentifier, intent: &str) -> Arc<Notify> {
        self.listener_added
            .entry((target.clone(), intent.to_string()))
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    /// Called whenever `AppDirectory::register_intent_listener` succeeds,
    /// waking every raise currently awaiting `(target, intent)` (§4.E
    /// "many raises may be pending simultaneously ... a listener
    /// registration wakes all waiters whose (instance, intent) matches").
    pub fn notify_listener_registered(&self, target: &FullyQualifiedAppIdentifier, intent: &str) {
        if let Some(notify) = self.listener_added.get(&(target.clone(), intent.to_string())) {
            notify.notify_waiters();
        }
    }

    /// Suspend until `has_listener` reports true, per §4.E step 3. There is
    /// no timeout: callers that want one must race this future themselves.
    pub async fn await_intent_listener(
        &self,
        target: &FullyQualifiedAppIdentifier,
        intent: &str,
        has_listener: impl Fn() -> bool,
    ) {
        loop {
            if has_listener() {
                return;
            }
            let notify = self.notify_handle(target, intent);
            let notified = notify.notified();
            if has_listener() {
                return;
            }
            notified.await;
        }
    }

    /// Begin tracking a raise: mints the pending-intent token and a
    /// one-shot result channel keyed by it (§4.E step 4). `target` is the
    /// instance the token is dispatched to, recorded so a later disconnect
    /// of `target` can fail this raise (§4.H).
    pub fn begin_raise(
        &self,
        originator: FullyQualifiedAppIdentifier,
        original_request_uuid: RequestUuid,
        target: FullyQualifiedAppIdentifier,
    ) -> (PendingIntentToken, oneshot::Receiver<Value>) {
        let token = PendingIntentToken::encode(originator, original_request_uuid);
        let (tx, rx) = oneshot::channel();
        self.pending_results.insert(token.0.clone(), tx);
        self.pending_by_target.entry(target).or_default().push(token.0.clone());
        (token, rx)
    }

    /// `onIntentResult` step 2-4: decode the token, resolve the waiter if
    /// still pending, and report whether a private-channel grant should
    /// follow (caller inspects `result` for a private channel itself).
    pub fn complete_raise(
        &self,
        token: &PendingIntentToken,
        result: Value,
    ) -> Result<(FullyQualifiedAppIdentifier, RequestUuid), IntentError> {
        let (originator, original_request_uuid) = token.decode()?;
        if let Some((_, tx)) = self.pending_results.remove(&token.0) {
            let _ = tx.send(result);
        }
        Ok((originator, original_request_uuid))
    }

    /// §4.H disconnect cascade: drop every token outstanding against
    /// `target` and report the originators so the caller can reply
    /// `IntentDeliveryFailed` to each (the receiver side observes this as
    /// the sender being dropped).
    pub fn fail_pending_for_target(&self, target: &FullyQualifiedAppIdentifier) -> Vec<FullyQualifiedAppIdentifier> {
        let Some((_, tokens)) = self.pending_by_target.remove(target) else {
            return Vec::new();
        };
        let mut originators = Vec::new();
        for token in tokens {
            if let Some((_, tx)) = self.pending_results.remove(&token) {
                drop(tx);
            }
            if let Ok((originator, _)) = PendingIntentToken(token).decode() {
                originators.push(originator);
            }
        }
        originators
    }

    /// Structural validation delegated to `interop_types::Context` so the
    /// intent engine never accepts a context it can't forward (§4.E step 1).
    pub fn validate_context(value: &Value) -> Result<Context, IntentError> {
        Context::validate(value).map_err(|_| IntentError::MalformedContext)
    }
}
