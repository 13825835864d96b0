//! `AppDirectoryClient` (§4.C "Loading policy"): abstracts the
//! `GET <url>/v2/apps` fetch so the directory loader can be unit tested
//! without a real HTTP client.

use async_trait::async_trait;
use interop_types::AppRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryFetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("{url} responded with message {message:?} instead of \"OK\"")]
    NotOk { url: String, message: String },
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AppDirectoryClient: Send + Sync {
    /// Fetch `<base_url>/v2/apps`. Per §6, any `message` value other than
    /// `"OK"` is treated as an empty catalog rather than an error; callers
    /// that want the distinction get it via `DirectoryFetchError::NotOk`,
    /// but the directory loader (§4.C) maps either outcome to an empty
    /// `Vec` and logs a warning rather than failing the whole load.
    async fn fetch_apps(&self, base_url: &str) -> Result<Vec<AppRecord>, DirectoryFetchError>;
}
