//! Local persistence façade over the storage backend.
//!
//! DESIGN
//! ======
//! `LocalStore` knows the site's key set (four flat fields, per-memory title
//! and text, photos) and assembles snapshots from it. It never talks to the
//! network; the sync coordinator sits on top of it.
//!
//! ERROR HANDLING
//! ==============
//! Inherits the backend contract: writes report `bool`, reads report
//! `Option` or a caller default. Failures are already logged below.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{DEFAULT_MEMORY_SLOTS, StorageConfig};
use crate::document::Snapshot;
use crate::field_key::{FieldKey, FlatField, MemoryField, known_keys};
use crate::storage::{MediumKind, StorageBackend};

/// Browser-style quota used for the usage estimate.
pub const ESTIMATED_LIMIT_BYTES: u64 = 5 * 1024 * 1024;

/// Usage report over every stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub medium: MediumKind,
    #[serde(rename = "totalSize")]
    pub total_bytes: u64,
    pub usage_percent: u64,
    pub estimated_limit: u64,
    pub item_sizes: BTreeMap<String, u64>,
}

pub struct LocalStore {
    backend: StorageBackend,
    memory_slots: u32,
}

impl LocalStore {
    #[must_use]
    pub fn new(backend: StorageBackend, memory_slots: u32) -> Self {
        Self { backend, memory_slots }
    }

    /// Select a medium for `config` and wrap it.
    #[must_use]
    pub fn open(config: &StorageConfig) -> Self {
        Self::new(StorageBackend::open(config), config.memory_slots)
    }

    /// A memory-only store with the default slot count.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(StorageBackend::in_memory(), DEFAULT_MEMORY_SLOTS)
    }

    #[must_use]
    pub fn medium(&self) -> MediumKind {
        self.backend.kind()
    }

    #[must_use]
    pub fn memory_slots(&self) -> u32 {
        self.memory_slots
    }

    // =========================================================================
    // RAW KEYS
    // =========================================================================

    pub fn set_field(&self, key: &str, value: &str) -> bool {
        self.backend.set(key, value)
    }

    #[must_use]
    pub fn get_field(&self, key: &str, default: &str) -> String {
        self.backend.get_or(key, default)
    }

    #[must_use]
    pub fn get_field_opt(&self, key: &str) -> Option<String> {
        self.backend.get(key)
    }

    pub fn remove_field(&self, key: &str) -> bool {
        self.backend.remove(key)
    }

    // =========================================================================
    // TYPED KEYS
    // =========================================================================

    pub fn set(&self, key: &FieldKey, value: &str) -> bool {
        self.set_field(&key.to_string(), value)
    }

    #[must_use]
    pub fn get(&self, key: &FieldKey) -> Option<String> {
        self.get_field_opt(&key.to_string())
    }

    pub fn remove(&self, key: &FieldKey) -> bool {
        self.remove_field(&key.to_string())
    }

    pub fn set_photo(&self, id: u32, data_url: &str) -> bool {
        self.set(&FieldKey::Photo(id), data_url)
    }

    #[must_use]
    pub fn photo(&self, id: u32) -> Option<String> {
        self.get(&FieldKey::Photo(id))
    }

    pub fn remove_photo(&self, id: u32) -> bool {
        self.remove(&FieldKey::Photo(id))
    }

    // =========================================================================
    // WHOLE STORE
    // =========================================================================

    /// Flat keys, then memory title/text for every slot. Photos excluded.
    #[must_use]
    pub fn known_keys(&self) -> Vec<FieldKey> {
        known_keys(self.memory_slots)
    }

    /// Remove every known key. True only if every removal succeeded; a failed
    /// removal does not stop the rest.
    pub fn clear_all(&self) -> bool {
        self.known_keys()
            .iter()
            .fold(true, |all_ok, key| self.remove(key) && all_ok)
    }

    /// Everything stored under known keys. A memory id appears only when at
    /// least one of its fields is stored.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for field in FlatField::ALL {
            snapshot.set_field(field, self.get(&FieldKey::Flat(field)));
        }
        for id in 1..=self.memory_slots {
            for field in MemoryField::ALL {
                if let Some(value) = self.get(&FieldKey::memory(field, id)) {
                    snapshot.memories.entry(id).or_default().set(field, value);
                }
            }
        }
        snapshot
    }

    #[must_use]
    pub fn usage(&self) -> StorageUsage {
        let item_sizes: BTreeMap<String, u64> = self
            .backend
            .entries()
            .into_iter()
            .map(|(key, value)| (key, value.len() as u64))
            .collect();
        let total_bytes: u64 = item_sizes.values().sum();
        StorageUsage {
            medium: self.medium(),
            total_bytes,
            usage_percent: (total_bytes * 100 + ESTIMATED_LIMIT_BYTES / 2) / ESTIMATED_LIMIT_BYTES,
            estimated_limit: ESTIMATED_LIMIT_BYTES,
            item_sizes,
        }
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
