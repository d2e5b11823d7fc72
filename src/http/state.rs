use super::store::{InMemoryTrackingStore, TrackingStore};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Where tracking records are written
    pub store: Arc<dyn TrackingStore>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryTrackingStore::new()))
    }

    pub fn with_store(store: Arc<dyn TrackingStore>) -> Self {
        Self { store }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
