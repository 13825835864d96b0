//! Opaque string identifiers shared across the root coordinator.
//!
//! Every identifier on this bus is, per the wire protocol, an opaque
//! string: proxies mint connection-attempt ids, the root mints instance
//! ids, directories mint app ids. None of them are required to be UUIDs,
//! though in practice the reference adapters use UUIDs for anything the
//! root itself mints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed, opaque string identifier.
macro_rules! define_string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing string as this identifier.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self, returning the underlying string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(AppId);
define_string_id!(InstanceId);
define_string_id!(ChannelId);
define_string_id!(ConnectionAttemptId);
define_string_id!(ListenerId);
define_string_id!(RequestUuid);

/// A fully-qualified app id: `<local>@<host>`, where `<host>` identifies the
/// directory that declared the local id. Two directories may declare the
/// same local id; the host suffix keeps them disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FullyQualifiedAppId(String);

/// Sentinel host used to qualify appIds when zero app-directory URLs are
/// configured, enabling listener-only scenarios without a directory.
pub const UNKNOWN_APP_DIRECTORY_HOST: &str = "unknown-app-directory";

impl FullyQualifiedAppId {
    /// Compose a fully-qualified id from a local app id and a directory host.
    pub fn new(local: &AppId, host: &str) -> Self {
        Self(format!("{}@{}", local.as_str(), host))
    }

    /// Parse a raw wire string, qualifying it with `default_host` if it
    /// carries no `@host` suffix of its own.
    pub fn parse_or_qualify(raw: &str, default_host: &str) -> Self {
        if raw.contains('@') {
            Self(raw.to_string())
        } else {
            Self(format!("{raw}@{default_host}"))
        }
    }

    /// The local (unqualified) app id portion, before the last `@`.
    pub fn local(&self) -> AppId {
        match self.0.rsplit_once('@') {
            Some((local, _host)) => AppId::new(local),
            None => AppId::new(self.0.as_str()),
        }
    }

    /// The directory host portion, after the last `@`, if present.
    pub fn host(&self) -> Option<&str> {
        self.0.rsplit_once('@').map(|(_, host)| host)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullyQualifiedAppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FullyQualifiedAppId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for FullyQualifiedAppId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A live instance of an app: the pair that identifies exactly one
/// connected proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FullyQualifiedAppIdentifier {
    pub app_id: FullyQualifiedAppId,
    pub instance_id: InstanceId,
}

impl FullyQualifiedAppIdentifier {
    pub fn new(app_id: FullyQualifiedAppId, instance_id: InstanceId) -> Self {
        Self {
            app_id,
            instance_id,
        }
    }
}

impl fmt::Display for FullyQualifiedAppIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_id, self.instance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_qualify_leaves_already_qualified_ids_alone() {
        let id = FullyQualifiedAppId::parse_or_qualify("chat@dir.example.com", "fallback-host");
        assert_eq!(id.as_str(), "chat@dir.example.com");
        assert_eq!(id.local().as_str(), "chat");
        assert_eq!(id.host(), Some("dir.example.com"));
    }

    #[test]
    fn parse_or_qualify_appends_default_host_when_missing() {
        let id = FullyQualifiedAppId::parse_or_qualify("chat", UNKNOWN_APP_DIRECTORY_HOST);
        assert_eq!(id.as_str(), "chat@unknown-app-directory");
    }

    #[test]
    fn display_formats_as_local_at_host() {
        let local = AppId::new("chat");
        let id = FullyQualifiedAppId::new(&local, "dir.example.com");
        assert_eq!(id.to_string(), "chat@dir.example.com");
    }
}
