use std::sync::Arc;

use catalog_store::{GitHubContentsClient, MemoryStore, RevisionStore, StoreError};
use catalog_sync::BatchSynchronizer;

use crate::config::{AppConfig, StoreSettings};

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable; both fields are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Configuration, read once at startup.
    pub config: Arc<AppConfig>,
    /// Revision store every synchronization run writes through.
    pub store: Arc<dyn RevisionStore>,
}

impl AppState {
    /// Build state with the store selected by `config.store`.
    pub fn new(config: AppConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn RevisionStore> = match &config.store {
            StoreSettings::GitHub(github) => Arc::new(GitHubContentsClient::new(github.clone())?),
            StoreSettings::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: AppConfig, store: Arc<dyn RevisionStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// A synchronizer over the shared store, using the configured limits.
    pub fn synchronizer(&self) -> BatchSynchronizer<Arc<dyn RevisionStore>> {
        BatchSynchronizer::with_limits(Arc::clone(&self.store), self.config.sync_limits())
    }
}
