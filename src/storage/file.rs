//! JSON-file media.
//!
//! The whole map is held in memory and rewritten to disk on every mutation.
//! A failed write rolls the in-memory map back so reads never see a value the
//! file does not hold.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use super::{MediumKind, StorageError, StorageMedium};

static SESSION_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct FileMedium {
    kind: MediumKind,
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
    remove_on_drop: bool,
}

impl FileMedium {
    /// Open the durable medium at `path`, loading what a previous run left.
    ///
    /// A missing file starts empty. A file that does not parse is logged and
    /// treated as empty; the next write replaces it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn durable(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "durable storage file is corrupt; starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        Ok(Self { kind: MediumKind::Durable, path, entries: Mutex::new(entries), remove_on_drop: false })
    }

    /// Open a per-process session medium in `dir`. The file is deleted on drop.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is not an existing directory.
    pub fn session(dir: &Path) -> Result<Self, StorageError> {
        if !dir.is_dir() {
            return Err(StorageError::Unavailable(format!("session dir {} does not exist", dir.display())));
        }
        let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("keepsake-session-{}-{seq}.json", std::process::id()));
        Ok(Self { kind: MediumKind::Session, path, entries: Mutex::new(BTreeMap::new()), remove_on_drop: true })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| StorageError::Io { path: parent.to_path_buf(), source })?;
        }
        std::fs::write(&self.path, raw).map_err(|source| StorageError::Io { path: self.path.clone(), source })
    }

    /// Apply `change` to the map and persist it; undo the change if the write fails.
    fn mutate(&self, key: &str, change: Option<&str>) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = match change {
            Some(value) => entries.insert(key.to_owned(), value.to_owned()),
            None => entries.remove(key),
        };

        if let Err(e) = self.write(&entries) {
            match previous {
                Some(old) => entries.insert(key.to_owned(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

impl StorageMedium for FileMedium {
    fn kind(&self) -> MediumKind {
        self.kind
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.mutate(key, Some(value))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.mutate(key, None)
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl Drop for FileMedium {
    fn drop(&mut self) {
        if self.remove_on_drop {
            // May not exist if nothing was ever stored.
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
