use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StorageBackend};

use crate::memory::InMemoryStore;
use crate::postgrest::SupabaseStore;
use crate::store::SchedulingStore;

/// Shared router state: configuration plus the store every cell works against.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SchedulingStore>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn SchedulingStore>) -> Self {
        Self { config, store }
    }

    /// Picks the backend named by `config.storage_backend`.
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn SchedulingStore> = match config.storage_backend {
            StorageBackend::Supabase => Arc::new(SupabaseStore::new(&config)),
            StorageBackend::Memory => {
                info!(
                    "Using in-memory slot store with {} seeded professionals; data is lost on restart",
                    config.seed_professionals.len()
                );
                Arc::new(InMemoryStore::with_professionals(config.seed_professionals.clone()))
            }
        };

        Self::new(Arc::new(config), store)
    }
}
