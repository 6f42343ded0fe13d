pub mod memory;
pub mod postgres;
pub mod store;

use std::sync::Arc;

use crate::config::{Config, StorageBackend};

pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations, PgStore};
#[cfg(test)]
pub use store::MockRecommendationStore;
pub use store::{RecommendationStore, StoreError, StoreResult};

/// Opens the configured storage backend, migrating PostgreSQL first
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn RecommendationStore>> {
    let store: Arc<dyn RecommendationStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database_uri, config.database_max_connections).await?;
            run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };

    tracing::info!(backend = store.name(), "Storage ready");
    Ok(store)
}
