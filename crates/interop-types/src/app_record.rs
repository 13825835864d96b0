//! `AppRecord`: the static catalog entry a directory declares for an app.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How an app is launched. Only `Web` carries a launch URL the built-in
/// fallback open strategy understands; the others are opaque to the root
/// and exist purely so the directory's declared shape round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum AppDetails {
    Web { url: String },
    Native { path: Option<String> },
    Citrix { resource: Option<String> },
    OnlineNative { launch_url: Option<String> },
    Other,
}

impl AppDetails {
    /// The web launch URL, if this record describes a web app.
    pub fn web_url(&self) -> Option<&str> {
        match self {
            AppDetails::Web { url } => Some(url.as_str()),
            _ => None,
        }
    }
}

/// A statically declared intent: the set of context types it accepts and,
/// optionally, the type of result it produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentDeclaration {
    pub contexts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
}

/// The catalog entry a directory declares for an app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRecord {
    /// The local (unqualified) app id as declared by the directory.
    pub app_id: String,
    pub name: Option<String>,
    pub details: AppDetails,
    #[serde(default)]
    pub intents: BTreeMap<String, IntentDeclaration>,
}

impl AppRecord {
    /// True if this record statically declares `intent` accepting a context
    /// of `context_type` (when given), per §4.C step 2.
    pub fn declares_intent(&self, intent: &str, context_type: Option<&str>) -> bool {
        let Some(decl) = self.intents.get(intent) else {
            return false;
        };
        match context_type {
            Some(ct) => decl.contexts.iter().any(|c| c == ct),
            None => true,
        }
    }

    /// Matching an app's declared result type against a requested
    /// `resultType`: substring match when the request contains `channel`,
    /// exact match otherwise (§4.C "Matching of apps that return channels").
    pub fn matches_result_type(&self, intent: &str, requested: Option<&str>) -> bool {
        let Some(requested) = requested else {
            return true;
        };
        let Some(decl) = self.intents.get(intent) else {
            return false;
        };
        let Some(declared) = decl.result_type.as_deref() else {
            return false;
        };
        if requested.contains("channel") {
            declared.contains(requested) || requested.contains(declared)
        } else {
            declared == requested
        }
    }
}
