//! HTTP client for the remote document store.
//!
//! Thin wrapper over `{base_url}/data`. Every failure comes back as a typed
//! [`SyncError`]; a disabled client fails with `SyncError::Disabled` before
//! touching the network. No retries here: the coordinator owns retry policy.

use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{RemoteStore, SyncError};
use crate::config::RemoteConfig;
use crate::document::{Document, Envelope, FieldUpdate};
use crate::storage::preview;

/// Resource path appended to the configured base URL.
pub const DATA_PATH: &str = "/data";

/// `{base}/data`, tolerating a trailing slash on `base`.
#[must_use]
pub fn resource_url(base_url: &str) -> String {
    format!("{}{DATA_PATH}", base_url.trim_end_matches('/'))
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct SyncClient {
    http: reqwest::Client,
    endpoint: String,
    enabled: bool,
}

impl SyncClient {
    /// # Errors
    ///
    /// Returns [`SyncError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| SyncError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, endpoint: resource_url(&config.base_url), enabled: config.enabled })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `GET /data`.
    ///
    /// # Errors
    ///
    /// Returns an error if sync is disabled, the request fails, the status is
    /// not 2xx, or the body is not a document.
    pub async fn try_fetch_all(&self) -> Result<Document, SyncError> {
        self.ensure_enabled()?;
        let response = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| SyncError::Request(e.to_string()))?;
        read_json(response).await
    }

    /// `POST /data` with `{key, value}`.
    ///
    /// # Errors
    ///
    /// As [`Self::try_fetch_all`], plus [`SyncError::Rejected`] for a
    /// `success: false` envelope.
    pub async fn try_update_field(&self, key: &str, value: &str) -> Result<Document, SyncError> {
        self.ensure_enabled()?;
        let body = FieldUpdate { key: key.to_owned(), value: value.to_owned() };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Request(e.to_string()))?;
        open_envelope(read_json(response).await?)
    }

    /// `PUT /data` with the whole document.
    ///
    /// # Errors
    ///
    /// As [`Self::try_update_field`].
    pub async fn try_replace_all(&self, document: &Document) -> Result<Document, SyncError> {
        self.ensure_enabled()?;
        let response = self
            .http
            .put(&self.endpoint)
            .json(document)
            .send()
            .await
            .map_err(|e| SyncError::Request(e.to_string()))?;
        open_envelope(read_json(response).await?)
    }

    fn ensure_enabled(&self) -> Result<(), SyncError> {
        if self.enabled { Ok(()) } else { Err(SyncError::Disabled) }
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SyncError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| SyncError::Request(e.to_string()))?;

    if !status.is_success() {
        return Err(SyncError::Status { status: status.as_u16(), body: text });
    }

    serde_json::from_str(&text).map_err(|e| SyncError::Parse(e.to_string()))
}

fn open_envelope(envelope: Envelope) -> Result<Document, SyncError> {
    match envelope {
        Envelope { success: true, data: Some(document), .. } => Ok(document),
        Envelope { success: true, data: None, .. } => Err(SyncError::Parse("envelope without data".to_owned())),
        Envelope { error, .. } => Err(SyncError::Rejected(error.unwrap_or_default())),
    }
}

// =============================================================================
// REMOTE STORE
// =============================================================================

#[async_trait::async_trait]
impl RemoteStore for SyncClient {
    async fn fetch_all(&self) -> Result<Document, SyncError> {
        self.try_fetch_all().await
    }

    async fn update_field(&self, key: &str, value: &str) -> Result<Document, SyncError> {
        let document = self.try_update_field(key, value).await?;
        debug!(key, value = %preview(value), "remote field updated");
        Ok(document)
    }

    async fn replace_all(&self, document: &Document) -> Result<Document, SyncError> {
        self.try_replace_all(document).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
