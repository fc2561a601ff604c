//! Shared fixtures for unit and end-to-end tests.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::document::Document;
use crate::state::AppState;
use crate::storage::{MediumKind, PROBE_KEY, StorageError, StorageMedium};
use crate::store::apply_update;
use crate::sync::{RemoteStore, SyncError};

// =============================================================================
// MOCK REMOTE
// =============================================================================

/// In-memory `RemoteStore` with switchable failure and latency.
///
/// `failing` answers with a retryable transport error, `rejecting` with a
/// `success: false` envelope error.
#[derive(Default)]
pub struct MockRemote {
    document: Mutex<Document>,
    failing: AtomicBool,
    rejecting: AtomicBool,
    delay_ms: AtomicU64,
    pub fetch_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub replace_calls: AtomicUsize,
}

impl MockRemote {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document: Mutex::new(document), ..Self::default() }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(u64::try_from(delay.as_millis()).unwrap(), Ordering::SeqCst);
    }

    #[must_use]
    pub fn document(&self) -> Document {
        self.document.lock().unwrap().clone()
    }

    async fn respond(&self) -> Result<(), SyncError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Request("mock remote unreachable".into()));
        }
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(SyncError::Rejected("Failed to save data".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteStore for MockRemote {
    async fn fetch_all(&self) -> Result<Document, SyncError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        Ok(self.document())
    }

    async fn update_field(&self, key: &str, value: &str) -> Result<Document, SyncError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        let mut document = self.document.lock().unwrap();
        apply_update(&mut document, key, value.to_owned());
        Ok(document.clone())
    }

    async fn replace_all(&self, incoming: &Document) -> Result<Document, SyncError> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        let mut document = self.document.lock().unwrap();
        *document = incoming.clone();
        Ok(document.clone())
    }
}

// =============================================================================
// MEDIA
// =============================================================================

/// A medium that fails every operation, including the probe.
pub struct FailingMedium(pub MediumKind);

impl StorageMedium for FailingMedium {
    fn kind(&self) -> MediumKind {
        self.0
    }

    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("failing medium".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("failing medium".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("failing medium".into()))
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StorageError> {
        Err(StorageError::Unavailable("failing medium".into()))
    }
}

/// A durable medium that passes the probe and then rejects every write.
#[derive(Default)]
pub struct FrozenMedium;

impl StorageMedium for FrozenMedium {
    fn kind(&self) -> MediumKind {
        MediumKind::Durable
    }

    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
        if key == PROBE_KEY {
            Ok(())
        } else {
            Err(StorageError::Unavailable("frozen medium".into()))
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if key == PROBE_KEY {
            Ok(())
        } else {
            Err(StorageError::Unavailable("frozen medium".into()))
        }
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StorageError> {
        Ok(Vec::new())
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// Serve the real router on an ephemeral port. Returns the base URL.
pub async fn spawn_test_server(data_file: &Path) -> String {
    let app = crate::routes::app(AppState::new(data_file));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Poll `condition` every 10ms for up to 2s.
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
