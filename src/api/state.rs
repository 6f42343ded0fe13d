use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::db::{MemoryStore, RecommendationStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecommendationStore>,
    static_dir: Option<PathBuf>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl AppState {
    pub fn new(store: Arc<dyn RecommendationStore>) -> Self {
        Self {
            store,
            static_dir: None,
        }
    }

    /// State backed by a fresh, empty in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Serve `index.html` from `dir` at `/` instead of the JSON banner
    pub fn with_static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    pub fn store(&self) -> &dyn RecommendationStore {
        self.store.as_ref()
    }

    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }
}
