//! Server-side document store: one JSON file holding the whole document.
//!
//! DESIGN
//! ======
//! Every request reads the file, applies its change and writes the file
//! back. There is no locking between concurrent requests: two writers that
//! interleave can lose one update. Acceptable for a single-editor site.
//!
//! ERROR HANDLING
//! ==============
//! Reads never fail: a missing file is seeded with the default document, an
//! unreadable or corrupt one is logged and the defaults are served without
//! touching the file. Writes return `StoreError`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::document::{Document, timestamp_now};
use crate::field_key::FieldKey;
use crate::storage::preview;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document, or the defaults when none can be read.
    pub async fn load(&self) -> Document {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no store file; seeding defaults");
                let mut document = Document::defaults();
                if let Err(e) = self.save(&mut document).await {
                    error!(error = %e, "seeding default document failed");
                }
                return document;
            }
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "store file unreadable; serving defaults");
                return Document::defaults();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            error!(error = %e, path = %self.path.display(), "store file corrupt; serving defaults");
            Document::defaults()
        })
    }

    /// Stamp `lastUpdated` and write the document as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory or the file cannot be written.
    pub async fn save(&self, document: &mut Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }
        document.last_updated = Some(timestamp_now());
        let raw = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })
    }

    /// Load, apply one field update, save. Saves even when the key was ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub async fn update_field(&self, key: &str, value: String) -> Result<Document, StoreError> {
        let mut document = self.load().await;
        apply_update(&mut document, key, value);
        self.save(&mut document).await?;
        Ok(document)
    }

    /// Overwrite the stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub async fn replace(&self, mut document: Document) -> Result<Document, StoreError> {
        self.save(&mut document).await?;
        Ok(document)
    }
}

/// Route one `{key, value}` update into the document. Keys outside the
/// field-key grammar, and photo keys, are ignored. Returns whether a field was set.
pub fn apply_update(document: &mut Document, key: &str, value: String) -> bool {
    match FieldKey::parse(key) {
        Ok(field_key) => {
            let value_preview = preview(&value);
            let applied = document.apply(&field_key, value);
            if applied {
                debug!(key, value = %value_preview, "document field updated");
            } else {
                debug!(key, "key has no document field; ignored");
            }
            applied
        }
        Err(e) => {
            warn!(error = %e, "ignoring update with malformed key");
            false
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
