//! Sync coordinator: local-first writes mirrored to the remote store.
//!
//! DESIGN
//! ======
//! Every write lands in [`LocalStore`] first and returns immediately. When
//! sync is enabled the key is marked pending with a fresh generation and a
//! task is queued for a single background worker, which pushes the field to
//! the remote store with bounded retries. Bulk syncs (`sync_all_pending`,
//! `push_snapshot`) replace the whole remote document from a local snapshot
//! and are serialized by an atomic guard; per-field tasks never wait on it.
//!
//! ERROR HANDLING
//! ==============
//! Remote failures are soft. A key stays pending until a remote write that
//! covered its latest generation succeeds, so a later bulk sync or restart
//! can finish the job. Every remote call is bounded by `SyncSettings::timeout`;
//! only errors that report themselves `retryable` are retried. Shutdown
//! waits at most `SyncSettings::drain_timeout` for the queue to empty.
//!
//! SYSTEM CONTEXT
//! ==============
//! Constructed once per process and shared by `Arc`. Needs a tokio runtime
//! when sync is enabled.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::types::{RemoteStore, SyncError};
use crate::config::SyncSettings;
use crate::document::{Document, Snapshot, timestamp_now};
use crate::persistence::{LocalStore, StorageUsage};
use crate::storage::preview;

/// Sync state as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub sync_enabled: bool,
    pub sync_in_progress: bool,
    pub pending_count: usize,
    pub last_sync_time: Option<String>,
    pub has_pending: bool,
}

#[derive(Debug)]
struct SyncTask {
    key: String,
    value: String,
    generation: u64,
}

// =============================================================================
// SHARED STATE
// =============================================================================

#[derive(Default)]
struct SyncState {
    /// key -> generation of its latest local write not yet confirmed remotely.
    pending: HashMap<String, u64>,
    next_generation: u64,
    last_sync: Option<String>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<SyncState>,
    bulk_in_progress: AtomicBool,
    worker_busy: AtomicBool,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn mark_pending(&self, key: &str) -> u64 {
        let mut state = self.lock();
        state.next_generation += 1;
        let generation = state.next_generation;
        state.pending.insert(key.to_owned(), generation);
        generation
    }

    /// Clear `key` if no newer write arrived since `generation` was captured.
    fn confirm(state: &mut SyncState, key: &str, generation: u64) {
        // EDGE: keep pending if the key was written again after the snapshot.
        if state.pending.get(key) == Some(&generation) {
            state.pending.remove(key);
        }
    }

    fn confirm_one(&self, key: &str, generation: u64) {
        let mut state = self.lock();
        Self::confirm(&mut state, key, generation);
        state.last_sync = Some(timestamp_now());
    }

    fn confirm_many(&self, captured: &[(String, u64)]) {
        let mut state = self.lock();
        for (key, generation) in captured {
            Self::confirm(&mut state, key, *generation);
        }
        state.last_sync = Some(timestamp_now());
    }

    fn record_sync(&self) {
        self.lock().last_sync = Some(timestamp_now());
    }

    fn pending_entries(&self) -> Vec<(String, u64)> {
        self.lock().pending.iter().map(|(k, g)| (k.clone(), *g)).collect()
    }
}

/// Releases the bulk guard on drop, including on early return or panic.
struct BulkGuard<'a>(&'a AtomicBool);

impl<'a> BulkGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BulkGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn with_timeout<F>(timeout: Duration, call: F) -> Result<Document, SyncError>
where
    F: Future<Output = Result<Document, SyncError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(SyncError::Timeout(timeout)))
}

// =============================================================================
// COORDINATOR
// =============================================================================

pub struct SyncCoordinator {
    local: Arc<LocalStore>,
    remote: Arc<dyn RemoteStore>,
    settings: SyncSettings,
    shared: Arc<Shared>,
    queue: Option<mpsc::Sender<SyncTask>>,
    worker: Option<JoinHandle<()>>,
}

impl SyncCoordinator {
    /// Build the coordinator. When sync is enabled the worker task is spawned
    /// on the current tokio runtime.
    #[must_use]
    pub fn new(local: Arc<LocalStore>, remote: Arc<dyn RemoteStore>, settings: SyncSettings) -> Self {
        let shared = Arc::new(Shared::default());
        let (queue, worker) = if settings.enabled {
            let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
            let worker = spawn_sync_worker(rx, Arc::clone(&remote), Arc::clone(&shared), settings.clone());
            (Some(tx), Some(worker))
        } else {
            (None, None)
        };

        info!(
            enabled = settings.enabled,
            medium = %local.medium(),
            timeout_ms = u64::try_from(settings.timeout.as_millis()).unwrap_or(u64::MAX),
            retries = settings.retries,
            queue_capacity = settings.queue_capacity,
            "sync coordinator configured"
        );

        Self { local, remote, settings, shared, queue, worker }
    }

    #[must_use]
    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    #[must_use]
    pub fn sync_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Pull the remote document into local storage. Remote values win for
    /// every non-empty field; nothing is queued back to the remote.
    pub async fn initialize(&self) -> bool {
        if !self.settings.enabled {
            return false;
        }
        match with_timeout(self.settings.timeout, self.remote.fetch_all()).await {
            Ok(document) => {
                let entries = document.to_entries();
                let count = entries.len();
                for (key, value) in entries {
                    self.local.set(&key, &value);
                }
                self.shared.record_sync();
                info!(count, "remote document loaded into local storage");
                true
            }
            Err(e) => {
                warn!(error = %e, "remote load failed; keeping local data");
                false
            }
        }
    }

    // =========================================================================
    // FIELD OPERATIONS
    // =========================================================================

    /// Write locally, then queue the remote update. Returns the local result.
    pub fn set_item(&self, key: &str, value: &str) -> bool {
        let saved = self.local.set_field(key, value);
        if saved && self.settings.enabled {
            let generation = self.shared.mark_pending(key);
            self.enqueue(SyncTask { key: key.to_owned(), value: value.to_owned(), generation });
        }
        saved
    }

    #[must_use]
    pub fn get_item(&self, key: &str, default: &str) -> String {
        self.local.get_field(key, default)
    }

    /// Remove locally; the remote sees the key cleared to an empty value.
    pub fn remove_item(&self, key: &str) -> bool {
        let removed = self.local.remove_field(key);
        if removed && self.settings.enabled {
            let generation = self.shared.mark_pending(key);
            self.enqueue(SyncTask { key: key.to_owned(), value: String::new(), generation });
        }
        removed
    }

    fn enqueue(&self, task: SyncTask) {
        let Some(tx) = &self.queue else {
            return;
        };
        match tx.try_send(task) {
            Ok(()) => {}
            Err(TrySendError::Full(task)) => {
                warn!(key = %task.key, "sync queue full; key stays pending");
            }
            Err(TrySendError::Closed(task)) => {
                warn!(key = %task.key, "sync queue closed; key stays pending");
            }
        }
    }

    /// Remove every known key, propagating the clears remotely.
    pub fn clear_all(&self) -> bool {
        self.local
            .known_keys()
            .iter()
            .fold(true, |all_ok, key| self.remove_item(&key.to_string()) && all_ok)
    }

    // =========================================================================
    // BULK SYNC
    // =========================================================================

    /// Push the local snapshot if anything is pending.
    pub async fn sync_all_pending(&self) -> bool {
        if !self.settings.enabled || self.pending_count() == 0 {
            return true;
        }
        self.push_snapshot().await
    }

    /// Replace the remote document with the local snapshot. False when sync
    /// is disabled, another bulk sync is running, or the remote call fails.
    pub async fn push_snapshot(&self) -> bool {
        if !self.settings.enabled {
            return false;
        }
        let Some(_guard) = BulkGuard::acquire(&self.shared.bulk_in_progress) else {
            debug!("bulk sync already in progress");
            return false;
        };

        let captured = self.shared.pending_entries();
        let document = self.local.snapshot().into_document();
        match with_timeout(self.settings.timeout, self.remote.replace_all(&document)).await {
            Ok(_) => {
                self.shared.confirm_many(&captured);
                info!(count = captured.len(), "local snapshot pushed to remote");
                true
            }
            Err(e) => {
                warn!(error = %e, pending = captured.len(), "bulk sync failed; keys stay pending");
                false
            }
        }
    }

    /// Re-pull the remote document.
    pub async fn force_sync(&self) -> bool {
        if !self.settings.enabled {
            return false;
        }
        self.initialize().await
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.local.snapshot()
    }

    #[must_use]
    pub fn usage(&self) -> StorageUsage {
        self.local.usage()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Pending keys, sorted.
    #[must_use]
    pub fn pending_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.shared.lock().pending.keys().cloned().collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        let state = self.shared.lock();
        let pending_count = state.pending.len();
        SyncStatus {
            sync_enabled: self.settings.enabled,
            sync_in_progress: self.shared.bulk_in_progress.load(Ordering::Acquire)
                || self.shared.worker_busy.load(Ordering::Acquire),
            pending_count,
            last_sync_time: state.last_sync.clone(),
            has_pending: pending_count > 0,
        }
    }

    #[must_use]
    pub fn is_data_synced(&self) -> bool {
        self.settings.enabled && self.pending_count() == 0
    }

    /// Close the queue and give the worker up to `drain_timeout` to finish
    /// queued tasks. Tasks still unsent at the deadline are dropped and their
    /// keys stay pending. Reports the final state.
    pub async fn shutdown(mut self) -> SyncStatus {
        self.queue.take();
        if let Some(mut worker) = self.worker.take() {
            match tokio::time::timeout(self.settings.drain_timeout, &mut worker).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "sync worker ended abnormally"),
                Err(_) => {
                    worker.abort();
                    self.shared.worker_busy.store(false, Ordering::Release);
                    warn!(
                        drain_ms = u64::try_from(self.settings.drain_timeout.as_millis()).unwrap_or(u64::MAX),
                        pending = self.pending_count(),
                        "sync worker did not drain in time; aborted"
                    );
                }
            }
        }
        self.status()
    }
}

// =============================================================================
// WORKER
// =============================================================================

fn spawn_sync_worker(
    mut rx: mpsc::Receiver<SyncTask>,
    remote: Arc<dyn RemoteStore>,
    shared: Arc<Shared>,
    settings: SyncSettings,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(task) = rx.recv().await {
            shared.worker_busy.store(true, Ordering::Release);
            push_field_with_retry(remote.as_ref(), &shared, &settings, &task).await;
            shared.worker_busy.store(false, Ordering::Release);
        }
        debug!("sync worker stopped");
    })
}

async fn push_field_with_retry(remote: &dyn RemoteStore, shared: &Shared, settings: &SyncSettings, task: &SyncTask) {
    let attempts = settings.retries.max(1);
    for attempt in 1..=attempts {
        match with_timeout(settings.timeout, remote.update_field(&task.key, &task.value)).await {
            Ok(_) => {
                shared.confirm_one(&task.key, task.generation);
                debug!(key = %task.key, value = %preview(&task.value), "field synced");
                return;
            }
            Err(e) if attempt < attempts && e.retryable() => {
                warn!(error = %e, key = %task.key, attempt, total = attempts, "field sync failed; retrying");
                tokio::time::sleep(settings.retry_base * u32::try_from(attempt).unwrap_or(u32::MAX)).await;
            }
            Err(e) => {
                warn!(error = %e, key = %task.key, attempt, "field sync failed; key stays pending");
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
