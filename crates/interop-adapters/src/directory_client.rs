//! `AppDirectoryClient`: the reference `GET <base>/v2/apps` fetch (§6
//! "Directory wire format").

use async_trait::async_trait;
use interop_ports::{AppDirectoryClient, DirectoryFetchError};
use interop_types::AppRecord;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    message: String,
    #[serde(default)]
    applications: Vec<AppRecord>,
}

pub struct ReqwestDirectoryClient {
    client: reqwest::Client,
}

impl ReqwestDirectoryClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestDirectoryClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl AppDirectoryClient for ReqwestDirectoryClient {
    async fn fetch_apps(&self, base_url: &str) -> Result<Vec<AppRecord>, DirectoryFetchError> {
        let url = format!("{}/v2/apps", base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| DirectoryFetchError::Request { url: url.clone(), source: err.into() })?;

        let body: DirectoryResponse = response
            .json()
            .await
            .map_err(|err| DirectoryFetchError::Request { url: url.clone(), source: err.into() })?;

        // §6: any `message` other than "OK" is treated as an empty
        // catalog by the caller, but we surface the distinction here so
        // `AppDirectory::load_all` can log it.
        if body.message != "OK" {
            return Err(DirectoryFetchError::NotOk { url, message: body.message });
        }
        Ok(body.applications)
    }
}
