//! The app directory and resolution engine (§4.C).

use crate::errors::DirectoryError;
use dashmap::DashMap;
use interop_ports::{AppDirectoryClient, AppResolver, ContextCandidate, IntentCandidate, ResolverError};
use interop_types::{
    AppId, AppRecord, Context, FullyQualifiedAppId, FullyQualifiedAppIdentifier, InstanceId,
    UNKNOWN_APP_DIRECTORY_HOST,
};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// The static catalog entry plus its currently live instances (§3 "Directory entry").
#[derive(Debug, Clone, Default)]
pub struct DirectoryEntry {
    pub application: Option<AppRecord>,
    pub instances: Vec<InstanceId>,
}

/// One dynamic intent registration an instance has made at runtime (§4.C
/// `registerIntentListener`), as distinct from an app's static declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicRegistration {
    pub intent: String,
    pub contexts: Vec<Context>,
}

/// `{intent, apps}` for directory query results, decoupled from the wire
/// shape so `interop-root` does the DTO conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIntent {
    pub intent: String,
    pub apps: Vec<AppMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMetadata {
    pub app_id: FullyQualifiedAppId,
    pub name: Option<String>,
    pub result_type: Option<String>,
}

pub struct AppDirectory {
    directory_urls: Vec<String>,
    client: Arc<dyn AppDirectoryClient>,
    resolver: Arc<dyn AppResolver>,
    catalog: DashMap<FullyQualifiedAppId, DirectoryEntry>,
    dynamic: DashMap<InstanceId, Vec<DynamicRegistration>>,
    instances: DashMap<InstanceId, FullyQualifiedAppIdentifier>,
    loaded: OnceCell<()>,
}

impl AppDirectory {
    pub fn new(
        directory_urls: Vec<String>,
        client: Arc<dyn AppDirectoryClient>,
        resolver: Arc<dyn AppResolver>,
    ) -> Self {
        Self {
            directory_urls,
            client,
            resolver,
            catalog: DashMap::new(),
            dynamic: DashMap::new(),
            instances: DashMap::new(),
            loaded: OnceCell::new(),
        }
    }

    /// The sentinel host used to qualify unqualified appIds (§4.C "Loading
    /// policy"). Always `unknown-app-directory` when zero directory URLs
    /// are configured; with at least one, unqualified ids are resolved
    /// against the configured hosts (first match, §9) and this sentinel is
    /// only a last-resort fallback.
    pub fn default_host(&self) -> &str {
        UNKNOWN_APP_DIRECTORY_HOST
    }

    /// Await the initial directory load, performing it on first call.
    /// Every other public operation calls this first (§4.C, §5).
    pub async fn ensure_loaded(&self) {
        self.loaded.get_or_init(|| self.load_all()).await;
    }

    async fn load_all(&self) {
        for url in &self.directory_urls {
            let host = hostname_of(url);
            match self.client.fetch_apps(url).await {
                Ok(apps) => {
                    for app in apps {
                        let fq = FullyQualifiedAppId::new(&AppId::new(app.app_id.as_str()), &host);
                        self.catalog.insert(
                            fq,
                            DirectoryEntry {
                                application: Some(app),
                                instances: Vec::new(),
                            },
                        );
                    }
                }
                Err(err) => {
                    tracing::warn!(directory_url = %url, error = %err, "directory fetch failed, contributing empty catalog");
                }
            }
        }
    }

    /// Resolve an unqualified or qualified appId string to a
    /// [`FullyQualifiedAppId`], per §9's first-match collision strategy.
    /// Call this (rather than `AppIdentifierRef::to_fully_qualified`)
    /// whenever the catalog should be consulted, e.g. for directory
    /// queries where an unqualified id should resolve against a configured
    /// directory before falling back to the sentinel host.
    pub fn qualify(&self, raw: &str) -> FullyQualifiedAppId {
        if raw.contains('@') {
            return FullyQualifiedAppId::from(raw);
        }
        for url in &self.directory_urls {
            let candidate = FullyQualifiedAppId::new(&AppId::new(raw), &hostname_of(url));
            if self.catalog.contains_key(&candidate) {
                return candidate;
            }
        }
        FullyQualifiedAppId::new(&AppId::new(raw), self.default_host())
    }

    /// `getAppDirectoryApplication` (§4.C table).
    pub async fn get_app_directory_application(&self, app_id: &FullyQualifiedAppId) -> Option<AppRecord> {
        self.ensure_loaded().await;
        self.catalog.get(app_id).and_then(|e| e.application.clone())
    }

    /// `getAppMetadata`: the directory returns `None`; turning that into
    /// `TargetAppUnavailable` is the caller's job (§4.C table, "via caller").
    pub async fn get_app_metadata(&self, identifier: &FullyQualifiedAppIdentifier) -> Option<AppMetadata> {
        self.ensure_loaded().await;
        let entry = self.catalog.get(&identifier.app_id)?;
        if !entry.instances.contains(&identifier.instance_id) {
            return None;
        }
        Some(AppMetadata {
            app_id: identifier.app_id.clone(),
            name: entry.application.as_ref().and_then(|a| a.name.clone()),
            result_type: None,
        })
    }

    /// `getAppInstances`.
    pub async fn get_app_instances(&self, app_id: &FullyQualifiedAppId) -> Option<Vec<FullyQualifiedAppIdentifier>> {
        self.ensure_loaded().await;
        let entry = self.catalog.get(app_id)?;
        Some(
            entry
                .instances
                .iter()
                .map(|instance_id| FullyQualifiedAppIdentifier::new(app_id.clone(), instance_id.clone()))
                .collect(),
        )
    }

    /// `registerNewInstance`: resolve `identity_url` against the directory
    /// by exact `{protocol, host, port, pathname}` match (§4.A step 4) and
    /// bind a fresh, or caller-supplied, `InstanceId`.
    pub async fn register_new_instance(
        &self,
        identity_url: &str,
        requested_instance_id: Option<InstanceId>,
    ) -> Result<(FullyQualifiedAppIdentifier, Option<AppRecord>), DirectoryError> {
        self.ensure_loaded().await;
        let matched = self.catalog.iter().find_map(|entry| {
            let record = entry.application.as_ref()?;
            let url = record.details.web_url()?;
            url_matches(url, identity_url).then(|| entry.key().clone())
        });

        let Some(app_id) = matched else {
            if !self.directory_urls.is_empty() {
                return Err(DirectoryError::AppNotFound);
            }
            // Listener-only mode: no directory configured at all, so any
            // identity url is accepted under the sentinel host.
            let app_id = FullyQualifiedAppId::new(&AppId::new(identity_url), self.default_host());
            return self.bind_instance(app_id, None, requested_instance_id).await;
        };

        let application = self.catalog.get(&app_id).and_then(|e| e.application.clone());
        self.bind_instance(app_id, application, requested_instance_id).await
    }

    async fn bind_instance(
        &self,
        app_id: FullyQualifiedAppId,
        application: Option<AppRecord>,
        requested_instance_id: Option<InstanceId>,
    ) -> Result<(FullyQualifiedAppIdentifier, Option<AppRecord>), DirectoryError> {
        let instance_id = requested_instance_id.unwrap_or_else(|| InstanceId::new(uuid::Uuid::new_v4().to_string()));
        self.catalog
            .entry(app_id.clone())
            .or_insert_with(|| DirectoryEntry {
                application: application.clone(),
                instances: Vec::new(),
            })
            .instances
            .push(instance_id.clone());
        let identifier = FullyQualifiedAppIdentifier::new(app_id, instance_id.clone());
        self.instances.insert(instance_id, identifier.clone());
        Ok((identifier, application))
    }

    /// `registerIntentListener`: records a dynamic `(intent, contexts)`
    /// registration for a live instance.
    pub async fn register_intent_listener(
        &self,
        identifier: &FullyQualifiedAppIdentifier,
        intent: String,
        contexts: Vec<Context>,
    ) -> Result<(), DirectoryError> {
        self.ensure_loaded().await;
        if !self.instances.contains_key(&identifier.instance_id) {
            return Err(DirectoryError::TargetInstanceUnavailable);
        }
        if !self.directory_urls.is_empty() && !self.catalog.contains_key(&identifier.app_id) {
            return Err(DirectoryError::TargetAppUnavailable);
        }
        self.dynamic
            .entry(identifier.instance_id.clone())
            .or_default()
            .push(DynamicRegistration { intent, contexts });
        Ok(())
    }

    /// `intentListenerUnsubscribeRequest`: drops the first dynamic
    /// registration matching `intent` for this instance. Silently a no-op
    /// if none matches (§4.G's "unsubscribe is a no-op on unknown ids"
    /// applies here too, since the root tracks the owning listener uuid
    /// itself and only calls this for registrations it actually made).
    pub fn unregister_intent_listener(&self, identifier: &FullyQualifiedAppIdentifier, intent: &str) {
        if let Some(mut regs) = self.dynamic.get_mut(&identifier.instance_id) {
            if let Some(pos) = regs.iter().position(|r| r.intent == intent) {
                regs.remove(pos);
            }
        }
    }

    /// True once `identifier` has registered a dynamic listener for
    /// `intent` (used by the intent engine's "await target listener",
    /// §4.E step 3).
    pub fn has_intent_listener(&self, identifier: &FullyQualifiedAppIdentifier, intent: &str) -> bool {
        self.dynamic
            .get(&identifier.instance_id)
            .map(|regs| regs.iter().any(|r| r.intent == intent))
            .unwrap_or(false)
    }

    /// `getContextForAppIntent`.
    pub fn get_context_for_app_intent(&self, identifier: &FullyQualifiedAppIdentifier, intent: &str) -> Option<Vec<String>> {
        let static_contexts = self
            .catalog
            .get(&identifier.app_id)
            .and_then(|e| e.application.as_ref()?.intents.get(intent).map(|d| d.contexts.clone()));
        let dynamic_contexts = self.dynamic.get(&identifier.instance_id).map(|regs| {
            regs.iter()
                .filter(|r| r.intent == intent)
                .flat_map(|r| r.contexts.iter().map(|c| c.context_type.clone()))
                .collect::<Vec<_>>()
        });
        match (static_contexts, dynamic_contexts) {
            (None, None) => None,
            (a, b) => {
                let mut merged = a.unwrap_or_default();
                merged.extend(b.unwrap_or_default());
                merged.sort();
                merged.dedup();
                Some(merged)
            }
        }
    }

    /// `getAppIntent`.
    pub async fn get_app_intent(&self, intent: &str, context_type: Option<&str>, result_type: Option<&str>) -> AppIntent {
        self.ensure_loaded().await;
        let apps = self.apps_for_intent(intent, context_type, result_type);
        AppIntent {
            intent: intent.to_string(),
            apps,
        }
    }

    /// `getAppIntentsForContext`, deduplicated per §4.C "Duplicate elimination".
    pub async fn get_app_intents_for_context(&self, context_type: &str, result_type: Option<&str>) -> Vec<AppIntent> {
        self.ensure_loaded().await;
        let mut intents: Vec<String> = self
            .catalog
            .iter()
            .flat_map(|e| e.application.as_ref().map(|a| a.intents.keys().cloned().collect::<Vec<_>>()).unwrap_or_default())
            .collect();
        intents.extend(self.dynamic.iter().flat_map(|e| e.value().iter().map(|r| r.intent.clone())));
        intents.sort();
        intents.dedup();

        intents
            .into_iter()
            .map(|intent| {
                let apps = self.apps_for_intent(&intent, Some(context_type), result_type);
                AppIntent { intent, apps }
            })
            .filter(|ai| !ai.apps.is_empty())
            .collect()
    }

    fn apps_for_intent(&self, intent: &str, context_type: Option<&str>, result_type: Option<&str>) -> Vec<AppMetadata> {
        let mut seen = std::collections::HashSet::new();
        let mut apps = Vec::new();
        for entry in self.catalog.iter() {
            let Some(record) = entry.application.as_ref() else { continue };
            if !record.declares_intent(intent, context_type) {
                continue;
            }
            if !record.matches_result_type(intent, result_type) {
                continue;
            }
            if seen.insert(entry.key().clone()) {
                apps.push(AppMetadata {
                    app_id: entry.key().clone(),
                    name: record.name.clone(),
                    result_type: record.intents.get(intent).and_then(|d| d.result_type.clone()),
                });
            }
        }
        apps
    }

    /// Candidate instances declaring or dynamically registering `intent`
    /// for `context_type` (§4.C "Resolution algorithm" step 2), optionally
    /// narrowed to one app.
    fn candidate_instances(&self, intent: &str, context_type: Option<&str>, app_filter: Option<&FullyQualifiedAppId>) -> Vec<FullyQualifiedAppIdentifier> {
        let mut out = Vec::new();
        for entry in self.catalog.iter() {
            if let Some(filter) = app_filter {
                if entry.key() != filter {
                    continue;
                }
            }
            let statically_declares = entry
                .application
                .as_ref()
                .map(|a| a.declares_intent(intent, context_type))
                .unwrap_or(false);
            for instance_id in &entry.instances {
                let identifier = FullyQualifiedAppIdentifier::new(entry.key().clone(), instance_id.clone());
                let dynamically_declares = self
                    .dynamic
                    .get(instance_id)
                    .map(|regs| {
                        regs.iter().any(|r| {
                            r.intent == intent
                                && match context_type {
                                    Some(ct) => r.contexts.iter().any(|c| c.context_type == ct),
                                    None => true,
                                }
                        })
                    })
                    .unwrap_or(false);
                if statically_declares || dynamically_declares {
                    out.push(identifier);
                }
            }
        }
        out.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        out.dedup();
        out
    }

    /// `resolveAppInstanceForIntent` (§4.C "Resolution algorithm").
    pub async fn resolve_app_instance_for_intent(
        &self,
        intent: &str,
        context_type: &str,
        app: Option<&FullyQualifiedAppIdentifier>,
    ) -> Result<FullyQualifiedAppIdentifier, DirectoryError> {
        self.ensure_loaded().await;
        if let Some(requested) = app {
            if self.instances.contains_key(&requested.instance_id) {
                return Ok(requested.clone());
            }
        }
        let app_filter = app.map(|a| &a.app_id);
        let candidates = self.candidate_instances(intent, Some(context_type), app_filter);
        match candidates.len() {
            0 => Err(DirectoryError::NoAppsFound),
            1 => Ok(candidates.into_iter().next().expect("len checked above")),
            _ => self
                .resolver
                .resolve_for_intent(intent.to_string(), candidates.into_iter().map(IntentCandidate::Instance).collect())
                .await
                .map_err(resolver_error_to_directory_error),
        }
    }

    /// `resolveAppInstanceForContext`.
    pub async fn resolve_app_instance_for_context(
        &self,
        context_type: &str,
        app: Option<&FullyQualifiedAppId>,
    ) -> Result<(String, FullyQualifiedAppIdentifier), DirectoryError> {
        self.ensure_loaded().await;
        let mut candidates = Vec::new();
        for intent_name in self.intents_accepting_context(context_type) {
            for instance in self.candidate_instances(&intent_name, Some(context_type), app) {
                candidates.push(ContextCandidate {
                    intent: intent_name.clone(),
                    target: instance,
                });
            }
        }
        match candidates.len() {
            0 => Err(DirectoryError::NoAppsFound),
            1 => {
                let only = candidates.into_iter().next().expect("len checked above");
                Ok((only.intent, only.target))
            }
            _ => self
                .resolver
                .resolve_for_context(candidates)
                .await
                .map(|picked| (picked.intent, picked.target))
                .map_err(resolver_error_to_directory_error),
        }
    }

    fn intents_accepting_context(&self, context_type: &str) -> Vec<String> {
        let mut intents: Vec<String> = self
            .catalog
            .iter()
            .flat_map(|e| {
                e.application
                    .as_ref()
                    .map(|a| {
                        a.intents
                            .iter()
                            .filter(|(_, decl)| decl.contexts.iter().any(|c| c == context_type))
                            .map(|(name, _)| name.clone())
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            })
            .collect();
        intents.extend(self.dynamic.iter().flat_map(|e| {
            e.value()
                .iter()
                .filter(|r| r.contexts.iter().any(|c| c.context_type == context_type))
                .map(|r| r.intent.clone())
                .collect::<Vec<_>>()
        }));
        intents.sort();
        intents.dedup();
        intents
    }

    /// §4.H cleanup: remove a disconnected instance from the catalog and
    /// its dynamic registrations.
    pub fn remove_instance(&self, identifier: &FullyQualifiedAppIdentifier) {
        self.instances.remove(&identifier.instance_id);
        self.dynamic.remove(&identifier.instance_id);
        if let Some(mut entry) = self.catalog.get_mut(&identifier.app_id) {
            entry.instances.retain(|id| id != &identifier.instance_id);
        }
    }

    /// Whether `instance_id` is currently a known live instance (used by
    /// other domain components that need to validate a target without a
    /// full directory round trip).
    pub fn is_live(&self, instance_id: &InstanceId) -> bool {
        self.instances.contains_key(instance_id)
    }
}

fn resolver_error_to_directory_error(err: ResolverError) -> DirectoryError {
    match err {
        ResolverError::UserCancelledResolution => DirectoryError::UserCancelled,
        ResolverError::NoAppsFound => DirectoryError::NoAppsFound,
        ResolverError::ResolverUnavailable => DirectoryError::TargetAppUnavailable,
    }
}

fn hostname_of(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or(url)
        .split(':')
        .next()
        .unwrap_or(url)
        .to_string()
}

/// Exact match on `{protocol, host, port, pathname}` (§4.A step 4); query
/// string policy is explicitly left unspecified (§9 "Open questions") so it
/// is ignored here rather than guessed at.
fn url_matches(declared: &str, identity_url: &str) -> bool {
    fn strip_query(u: &str) -> &str {
        u.split(['?', '#']).next().unwrap_or(u)
    }
    strip_query(declared) == strip_query(identity_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use interop_ports::{AppDirectoryClient, DirectoryFetchError, NoUiAppResolver};
    use interop_types::{AppDetails, IntentDeclaration};
    use std::collections::BTreeMap;

    struct StaticClient(Vec<AppRecord>);

    #[async_trait::async_trait]
    impl AppDirectoryClient for StaticClient {
        async fn fetch_apps(&self, _base_url: &str) -> Result<Vec<AppRecord>, DirectoryFetchError> {
            Ok(self.0.clone())
        }
    }

    fn chat_app() -> AppRecord {
        let mut intents = BTreeMap::new();
        intents.insert(
            "StartChat".to_string(),
            IntentDeclaration {
                contexts: vec!["fdc3.contact".to_string()],
                result_type: None,
            },
        );
        AppRecord {
            app_id: "chat".to_string(),
            name: Some("Chat".to_string()),
            details: AppDetails::Web {
                url: "https://chat.example.com/app".to_string(),
            },
            intents,
        }
    }

    fn directory_with_one_app() -> AppDirectory {
        AppDirectory::new(
            vec!["https://dir.example.com".to_string()],
            Arc::new(StaticClient(vec![chat_app()])),
            Arc::new(NoUiAppResolver),
        )
    }

    #[tokio::test]
    async fn register_new_instance_matches_identity_url_exactly() {
        let directory = directory_with_one_app();
        let (identifier, record) = directory
            .register_new_instance("https://chat.example.com/app", None)
            .await
            .expect("should match");
        assert_eq!(identifier.app_id.local().as_str(), "chat");
        assert!(record.is_some());
    }

    #[tokio::test]
    async fn register_new_instance_rejects_unknown_url_when_directory_configured() {
        let directory = directory_with_one_app();
        let result = directory.register_new_instance("https://ghost.example.com", None).await;
        assert_eq!(result.unwrap_err(), DirectoryError::AppNotFound);
    }

    #[tokio::test]
    async fn zero_directories_auto_qualifies_with_sentinel_host() {
        let directory = AppDirectory::new(vec![], Arc::new(StaticClient(vec![])), Arc::new(NoUiAppResolver));
        let (identifier, record) = directory.register_new_instance("local-app", None).await.unwrap();
        assert_eq!(identifier.app_id.host(), Some(UNKNOWN_APP_DIRECTORY_HOST));
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn register_intent_listener_requires_known_instance() {
        let directory = directory_with_one_app();
        let ghost = FullyQualifiedAppIdentifier::new(
            FullyQualifiedAppId::new(&AppId::new("chat"), "dir.example.com"),
            InstanceId::new("not-registered"),
        );
        let result = directory
            .register_intent_listener(&ghost, "StartChat".to_string(), vec![])
            .await;
        assert_eq!(result.unwrap_err(), DirectoryError::TargetInstanceUnavailable);
    }

    #[tokio::test]
    async fn unregister_intent_listener_drops_the_matching_registration() {
        let directory = directory_with_one_app();
        let (identifier, _) = directory
            .register_new_instance("https://chat.example.com/app", None)
            .await
            .unwrap();
        directory
            .register_intent_listener(&identifier, "StartChat".to_string(), vec![])
            .await
            .unwrap();
        assert!(directory.has_intent_listener(&identifier, "StartChat"));

        directory.unregister_intent_listener(&identifier, "StartChat");
        assert!(!directory.has_intent_listener(&identifier, "StartChat"));
    }

    #[tokio::test]
    async fn resolve_app_instance_for_intent_auto_selects_single_candidate() {
        let directory = directory_with_one_app();
        let (identifier, _) = directory
            .register_new_instance("https://chat.example.com/app", None)
            .await
            .unwrap();
        let resolved = directory
            .resolve_app_instance_for_intent("StartChat", "fdc3.contact", None)
            .await
            .unwrap();
        assert_eq!(resolved, identifier);
    }

    #[tokio::test]
    async fn resolve_app_instance_for_intent_reports_no_apps_found() {
        let directory = directory_with_one_app();
        let result = directory.resolve_app_instance_for_intent("Ghost", "fdc3.contact", None).await;
        assert_eq!(result.unwrap_err(), DirectoryError::NoAppsFound);
    }

    #[tokio::test]
    async fn get_app_intents_for_context_dedupes_apps_per_intent() {
        let directory = directory_with_one_app();
        directory.ensure_loaded().await;
        let result = directory.get_app_intents_for_context("fdc3.contact", None).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].intent, "StartChat");
        assert_eq!(result[0].apps.len(), 1);
    }

    #[tokio::test]
    async fn qualify_prefers_a_catalog_match_over_the_sentinel_host() {
        let directory = directory_with_one_app();
        directory.ensure_loaded().await;
        let qualified = directory.qualify("chat");
        assert_eq!(qualified.host(), Some("dir.example.com"));
    }

    #[tokio::test]
    async fn qualify_falls_back_to_sentinel_host_when_unknown() {
        let directory = directory_with_one_app();
        directory.ensure_loaded().await;
        let qualified = directory.qualify("ghost");
        assert_eq!(qualified.host(), Some(UNKNOWN_APP_DIRECTORY_HOST));
    }
}
