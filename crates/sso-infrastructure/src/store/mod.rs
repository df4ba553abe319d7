//! Keyed expiring store adapters

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use sso_core::{DomainError, KeyedExpiringStore};
use sso_shared::config::{StoreBackend, StoreSettings};

/// Store opened by the process entry point. Cloning shares the same
/// underlying connection pool or map.
#[derive(Clone)]
pub enum StoreHandle {
    Memory(Arc<MemoryStore>),
    Redis(Arc<RedisStore>),
}

impl StoreHandle {
    pub async fn open(settings: &StoreSettings) -> Result<Self, DomainError> {
        match settings.backend {
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Ok(StoreHandle::Memory(Arc::new(MemoryStore::new())))
            }
            StoreBackend::Redis => {
                let store =
                    RedisStore::connect(&settings.redis_url, settings.max_connections).await?;
                Ok(StoreHandle::Redis(Arc::new(store)))
            }
        }
    }

    pub fn store(&self) -> Arc<dyn KeyedExpiringStore> {
        match self {
            StoreHandle::Memory(store) => store.clone(),
            StoreHandle::Redis(store) => store.clone(),
        }
    }

    /// Redis expires keys itself; only the memory backend needs a sweeper.
    pub fn spawn_sweeper(&self, every: Duration) -> Option<JoinHandle<()>> {
        match self {
            StoreHandle::Memory(store) => Some(tokio::spawn(store.clone().run_sweeper(every))),
            StoreHandle::Redis(_) => None,
        }
    }

    pub fn close(&self) {
        match self {
            StoreHandle::Memory(store) => store.clear(),
            StoreHandle::Redis(store) => store.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_memory_backend() {
        let settings = StoreSettings {
            backend: StoreBackend::Memory,
            redis_url: String::new(),
            max_connections: 1,
            sweep_interval_seconds: 60,
        };
        let handle = StoreHandle::open(&settings).await.unwrap();
        let store = handle.store();
        store
            .put("session:u1", "{}".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("session:u1").await.unwrap().as_deref(), Some("{}"));

        let sweeper = handle.spawn_sweeper(Duration::from_secs(60)).unwrap();
        sweeper.abort();
        handle.close();
        assert!(store.get("session:u1").await.unwrap().is_none());
    }
}
