//! `OpenApplicationStrategy` (§4.F): a pluggable launch mechanism tried in
//! configured order until one accepts the target app record.

use async_trait::async_trait;
use interop_types::{AppRecord, ConnectionAttemptId, Context};
use thiserror::Error;

/// What a strategy is asked to launch: the directory's static record for
/// the app, plus the context that will eventually be handed off to it
/// (§4.F step 6), if any.
#[derive(Debug, Clone)]
pub struct OpenRequestDescriptor {
    pub app_directory_record: AppRecord,
    pub context: Option<Context>,
}

#[derive(Debug, Error)]
pub enum OpenStrategyError {
    #[error("launch failed: {0}")]
    LaunchFailed(String),
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OpenApplicationStrategy: Send + Sync {
    /// True if this strategy knows how to launch the given app (§4.F step 3).
    fn can_open(&self, descriptor: &OpenRequestDescriptor) -> bool;

    /// Launch the app, returning the `connectionAttemptUuid` the new
    /// instance's handshake (§4.A) will carry so the orchestrator can bind
    /// it to the resulting `InstanceId`.
    async fn open(
        &self,
        descriptor: &OpenRequestDescriptor,
    ) -> Result<ConnectionAttemptId, OpenStrategyError>;
}
