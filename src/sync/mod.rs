//! Remote sync: the HTTP client for the document store and the coordinator
//! that mirrors local writes to it.

pub mod client;
pub mod coordinator;
pub mod types;

pub use client::SyncClient;
pub use coordinator::{SyncCoordinator, SyncStatus};
pub use types::{RemoteStore, SyncError};
