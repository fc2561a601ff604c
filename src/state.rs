//! Shared application state.
//!
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! store is just a path, so cloning per request is cheap.

use std::path::PathBuf;

use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
}

impl AppState {
    #[must_use]
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self { store: DocumentStore::new(data_file) }
    }
}
