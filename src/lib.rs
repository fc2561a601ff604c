//! keepsake: layered storage and sync for a personalized greeting site.
//!
//! SYSTEM CONTEXT
//! ==============
//! The greeting site edits a small set of text fields (hero banner, memory
//! sections, closing message) and photos. Every edit lands in local storage
//! first; a coordinator then mirrors it, best effort, to a single JSON
//! document served by `keepsake-server`.
//!
//! ```text
//! caller -> SyncCoordinator -> LocalStore -> StorageBackend -> medium
//!                |
//!                +-> worker queue -> RemoteStore (SyncClient) -> HTTP /data
//!                                                          -> DocumentStore -> file
//! ```

pub mod config;
pub mod document;
pub mod field_key;
pub mod persistence;
pub mod routes;
pub mod state;
pub mod storage;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_helpers;
