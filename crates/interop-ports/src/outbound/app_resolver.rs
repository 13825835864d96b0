//! `AppResolver` (§4.C step 3): the narrow interface onto the "resolver
//! UI" out-of-scope collaborator that lets a user pick between candidate
//! apps for an ambiguous intent or context resolution.

use async_trait::async_trait;
use interop_types::FullyQualifiedAppIdentifier;
use thiserror::Error;

/// One resolvable target: an app that either already has a live instance,
/// or is only known statically (declared by a directory but not currently
/// running). Only instance-bearing candidates can ultimately receive an
/// `IntentEvent` (§4.E awaits a target's listener registration), but
/// static candidates are still shown to the resolver for display parity
/// with the directory query operations (§4.C).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentCandidate {
    Instance(FullyQualifiedAppIdentifier),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolverError {
    #[error("user cancelled app resolution")]
    UserCancelledResolution,
    #[error("no apps found for resolution")]
    NoAppsFound,
    #[error("resolver UI is unavailable")]
    ResolverUnavailable,
}

/// A context-resolution candidate additionally carries the intent it would
/// be raised with, since `resolveAppInstanceForContext` must return
/// `{intent, app}` (§4.C table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextCandidate {
    pub intent: String,
    pub target: FullyQualifiedAppIdentifier,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AppResolver: Send + Sync {
    /// Ambiguous intent resolution (§4.C step 3, `resolveAppInstanceForIntent`).
    async fn resolve_for_intent(
        &self,
        intent: String,
        candidates: Vec<IntentCandidate>,
    ) -> Result<FullyQualifiedAppIdentifier, ResolverError>;

    /// Ambiguous context resolution (`resolveAppInstanceForContext`): the
    /// intent itself is also chosen by the resolver.
    async fn resolve_for_context(
        &self,
        candidates: Vec<ContextCandidate>,
    ) -> Result<ContextCandidate, ResolverError>;
}

/// Auto-selects when exactly one candidate is offered, otherwise rejects
/// with `ResolverUnavailable`. Used when no UI provider is configured
/// (§6 `uiProvider` is optional) and as a deterministic test double.
#[derive(Debug, Default)]
pub struct NoUiAppResolver;

#[async_trait]
impl AppResolver for NoUiAppResolver {
    async fn resolve_for_intent(
        &self,
        _intent: String,
        mut candidates: Vec<IntentCandidate>,
    ) -> Result<FullyQualifiedAppIdentifier, ResolverError> {
        match candidates.len() {
            0 => Err(ResolverError::NoAppsFound),
            1 => match candidates.remove(0) {
                IntentCandidate::Instance(target) => Ok(target),
            },
            _ => Err(ResolverError::ResolverUnavailable),
        }
    }

    async fn resolve_for_context(
        &self,
        mut candidates: Vec<ContextCandidate>,
    ) -> Result<ContextCandidate, ResolverError> {
        match candidates.len() {
            0 => Err(ResolverError::NoAppsFound),
            1 => Ok(candidates.remove(0)),
            _ => Err(ResolverError::ResolverUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interop_types::{AppId, FullyQualifiedAppId, InstanceId};

    fn target(local: &str) -> FullyQualifiedAppIdentifier {
        FullyQualifiedAppIdentifier::new(
            FullyQualifiedAppId::new(&AppId::new(local), "dir.example.com"),
            InstanceId::new("inst-1"),
        )
    }

    #[tokio::test]
    async fn no_ui_resolver_auto_selects_single_candidate() {
        let resolver = NoUiAppResolver;
        let result = resolver
            .resolve_for_intent(
                "StartChat".to_string(),
                vec![IntentCandidate::Instance(target("chat"))],
            )
            .await;
        assert_eq!(result, Ok(target("chat")));
    }

    #[tokio::test]
    async fn no_ui_resolver_rejects_ambiguous_candidates() {
        let resolver = NoUiAppResolver;
        let result = resolver
            .resolve_for_intent(
                "StartChat".to_string(),
                vec![
                    IntentCandidate::Instance(target("chat-a")),
                    IntentCandidate::Instance(target("chat-b")),
                ],
            )
            .await;
        assert_eq!(result, Err(ResolverError::ResolverUnavailable));
    }

    #[tokio::test]
    async fn no_ui_resolver_rejects_empty_candidates() {
        let resolver = NoUiAppResolver;
        let result = resolver.resolve_for_intent("StartChat".to_string(), vec![]).await;
        assert_eq!(result, Err(ResolverError::NoAppsFound));
    }
}
