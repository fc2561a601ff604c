//! Sync types: the remote-store seam and its errors.

use std::time::Duration;

use crate::document::Document;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by remote sync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response (connect, DNS, transport).
    #[error("remote request failed: {0}")]
    Request(String),

    /// The remote store answered with a non-success status.
    #[error("remote response error: status {status}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("remote response parse failed: {0}")]
    Parse(String),

    /// The remote store answered `success: false`.
    #[error("remote store rejected the write: {0}")]
    Rejected(String),

    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("remote sync is disabled")]
    Disabled,
}

impl SyncError {
    /// Whether another attempt could succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Timeout(_) | Self::Status { status: 429 | 500..=599, .. }
        )
    }
}

// =============================================================================
// REMOTE STORE TRAIT
// =============================================================================

/// The remote document store. Callers decide what to log and whether to
/// retry from the returned [`SyncError`]. Enables mocking in tests.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the whole remote document.
    async fn fetch_all(&self) -> Result<Document, SyncError>;

    /// Write one field; returns the updated document.
    async fn update_field(&self, key: &str, value: &str) -> Result<Document, SyncError>;

    /// Replace the whole document; returns what the store saved.
    async fn replace_all(&self, document: &Document) -> Result<Document, SyncError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
