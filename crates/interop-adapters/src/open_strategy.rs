//! `OpenApplicationStrategy`: the built-in fallback (§4.F step 3 "If none
//! succeeds but a web URL is available, use the built-in fallback"). This
//! is the one reference strategy shipped with the root; composition
//! appends it last so any site-specific strategies configured ahead of it
//! get first refusal.
//!
//! A native process has no frame tree to open a browser window into, so
//! the proxy-side launch itself stays an out-of-scope collaborator (§1):
//! this strategy mints the `connectionAttemptUuid` the handshake will
//! carry and logs the URL an operator's launcher is expected to navigate
//! to, rather than spawning a window itself.

use async_trait::async_trait;
use interop_ports::{OpenApplicationStrategy, OpenRequestDescriptor, OpenStrategyError};
use interop_types::ConnectionAttemptId;

#[derive(Debug, Default)]
pub struct WebOpenStrategy;

#[async_trait]
impl OpenApplicationStrategy for WebOpenStrategy {
    fn can_open(&self, descriptor: &OpenRequestDescriptor) -> bool {
        descriptor.app_directory_record.details.web_url().is_some()
    }

    async fn open(&self, descriptor: &OpenRequestDescriptor) -> Result<ConnectionAttemptId, OpenStrategyError> {
        let url = descriptor
            .app_directory_record
            .details
            .web_url()
            .ok_or_else(|| OpenStrategyError::LaunchFailed("app record carries no web url".to_string()))?;

        let attempt = ConnectionAttemptId::new(uuid::Uuid::new_v4().to_string());
        tracing::info!(
            url,
            app_id = %descriptor.app_directory_record.app_id,
            connection_attempt_uuid = %attempt,
            "built-in web open strategy: direct the proxy to this URL to complete the handshake"
        );
        Ok(attempt)
    }
}
