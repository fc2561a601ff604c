//! Key-value storage backend.
//!
//! DESIGN
//! ======
//! Three media in priority order:
//! - durable: a JSON file that survives restarts
//! - session: a JSON file in the temp dir, deleted when the process drops it
//! - memory: a map owned by the process
//!
//! The medium is chosen once, at construction, by probing each candidate with
//! a throwaway write and remove. The first candidate that passes wins; when
//! none does, a fresh in-memory map is used. Every later call goes straight
//! to the chosen medium.
//!
//! ERROR HANDLING
//! ==============
//! Media report `StorageError`. The backend logs and flattens those into
//! `bool`/`Option` so callers never see a storage failure directly. Stored
//! values `""`, `"null"` and `"undefined"` read back as absent.

mod file;
mod memory;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{StorageConfig, StoragePreference};

pub use file::FileMedium;
pub use memory::MemoryMedium;

/// Key used by the availability probe.
pub const PROBE_KEY: &str = "__storage_test__";

/// File name of the durable medium inside the data dir.
pub const DURABLE_FILE_NAME: &str = "local-storage.json";

const PREVIEW_CHARS: usize = 50;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage medium unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// MEDIUM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediumKind {
    Durable,
    Session,
    Memory,
}

impl fmt::Display for MediumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Durable => "durable",
            Self::Session => "session",
            Self::Memory => "memory",
        })
    }
}

/// One storage medium. Values are opaque strings.
pub trait StorageMedium: Send + Sync {
    fn kind(&self) -> MediumKind;

    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn entries(&self) -> Result<Vec<(String, String)>, StorageError>;
}

fn probe(medium: &dyn StorageMedium) -> Result<(), StorageError> {
    medium.set(PROBE_KEY, PROBE_KEY)?;
    medium.remove(PROBE_KEY)
}

/// Stored values that mean "nothing here".
pub(crate) fn is_absent(value: &str) -> bool {
    value.is_empty() || value == "null" || value == "undefined"
}

/// First 50 characters of a value, for log lines.
pub(crate) fn preview(value: &str) -> String {
    match value.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_owned(),
    }
}

// =============================================================================
// BACKEND
// =============================================================================

pub struct StorageBackend {
    medium: Box<dyn StorageMedium>,
}

impl StorageBackend {
    /// Build the candidate list for `config` and select a medium from it.
    #[must_use]
    pub fn open(config: &StorageConfig) -> Self {
        let mut candidates: Vec<Box<dyn StorageMedium>> = Vec::new();

        if matches!(config.preference, StoragePreference::Auto | StoragePreference::Durable) {
            match FileMedium::durable(config.data_dir.join(DURABLE_FILE_NAME)) {
                Ok(medium) => candidates.push(Box::new(medium)),
                Err(e) => warn!(error = %e, "durable storage could not be opened"),
            }
        }
        if !matches!(config.preference, StoragePreference::Memory) {
            match FileMedium::session(&config.session_dir) {
                Ok(medium) => candidates.push(Box::new(medium)),
                Err(e) => warn!(error = %e, "session storage could not be opened"),
            }
        }

        Self::select(candidates)
    }

    /// Use the first candidate that passes the probe, else an in-memory map.
    #[must_use]
    pub fn select(candidates: Vec<Box<dyn StorageMedium>>) -> Self {
        for medium in candidates {
            match probe(medium.as_ref()) {
                Ok(()) => {
                    info!(medium = %medium.kind(), "storage medium selected");
                    return Self { medium };
                }
                Err(e) => warn!(medium = %medium.kind(), error = %e, "storage medium unavailable; trying next"),
            }
        }
        info!(medium = %MediumKind::Memory, "storage medium selected");
        Self::in_memory()
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self { medium: Box::new(MemoryMedium::new()) }
    }

    #[must_use]
    pub fn kind(&self) -> MediumKind {
        self.medium.kind()
    }

    pub fn set(&self, key: &str, value: &str) -> bool {
        match self.medium.set(key, value) {
            Ok(()) => {
                debug!(medium = %self.kind(), key, value = %preview(value), "saved");
                true
            }
            Err(e) => {
                warn!(medium = %self.kind(), key, error = %e, "save failed");
                false
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match self.medium.get(key) {
            Ok(Some(value)) if !is_absent(&value) => Some(value),
            Ok(_) => None,
            Err(e) => {
                warn!(medium = %self.kind(), key, error = %e, "load failed");
                None
            }
        }
    }

    #[must_use]
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.medium.remove(key) {
            Ok(()) => {
                debug!(medium = %self.kind(), key, "removed");
                true
            }
            Err(e) => {
                warn!(medium = %self.kind(), key, error = %e, "remove failed");
                false
            }
        }
    }

    /// Every stored pair, including values that read back as absent.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        self.medium.entries().unwrap_or_else(|e| {
            warn!(medium = %self.kind(), error = %e, "listing entries failed");
            Vec::new()
        })
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
