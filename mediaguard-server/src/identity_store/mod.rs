//! Identity store selection
//!
//! The server persists identities in PostgreSQL when `DATABASE_URL` is set.
//! Without it, an in-memory store is used (useful for development, but
//! identities and digests are lost on restart).

mod postgres;

pub use postgres::{store_error, PostgresIdentityStore};

use std::sync::Arc;

use mediaguard_core::{ContentIdentityStore, MemoryIdentityStore, StoreResult};

use crate::config::Config;

/// Identity storage backend
#[derive(Clone)]
pub enum IdentityBackend {
    /// PostgreSQL storage (production)
    Postgres(Arc<PostgresIdentityStore>),
    /// In-memory storage (development fallback)
    Memory(Arc<MemoryIdentityStore>),
    /// Any other store implementation, treated as non-persistent
    Custom(Arc<dyn ContentIdentityStore>),
}

impl IdentityBackend {
    /// Connect the backend selected by the configuration
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        match &config.database_url {
            Some(url) => {
                tracing::info!("Using PostgreSQL identity storage");
                let store = PostgresIdentityStore::new(url, config.database_max_connections).await?;
                Ok(Self::Postgres(Arc::new(store)))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory storage");
                Ok(Self::in_memory())
            }
        }
    }

    /// Create an in-memory backend (development only)
    pub fn in_memory() -> Self {
        Self::Memory(Arc::new(MemoryIdentityStore::new()))
    }

    /// Wrap an existing store implementation
    pub fn from_store(store: Arc<dyn ContentIdentityStore>) -> Self {
        Self::Custom(store)
    }

    /// The store handed to the orchestrators
    pub fn store(&self) -> Arc<dyn ContentIdentityStore> {
        match self {
            Self::Postgres(pg) => pg.clone(),
            Self::Memory(mem) => mem.clone(),
            Self::Custom(store) => store.clone(),
        }
    }

    /// Check if using persistent storage
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Postgres(_))
    }

    /// Check database health (always Ok for non-database backends)
    pub async fn check_health(&self) -> StoreResult<()> {
        match self {
            Self::Postgres(pg) => pg.check_health().await,
            Self::Memory(_) | Self::Custom(_) => Ok(()),
        }
    }
}
