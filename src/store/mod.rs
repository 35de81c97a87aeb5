//! Shared store module: dedup keys, the SMS queue, and filter rules all live
//! in one key space behind the [`AppStore`] trait.
//!
//! Backends:
//! - Redis (durable, distributed) for production
//! - Memory (in-process) for tests and development
//!
//! The store handle is constructed once at startup and passed explicitly to
//! every component that needs it; there is no process-wide singleton.

mod error;
mod memory;
mod redis;
mod traits;

use std::sync::Arc;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use traits::AppStore;

use crate::config::{StoreBackend, StoreConfig};

/// Cheaply clonable handle to the configured store backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn AppStore>,
}

impl Store {
    /// Build a store from configuration.
    pub async fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let backend: Arc<dyn AppStore> = match config.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Redis => Arc::new(RedisStore::new(&config.redis).await?),
        };
        Ok(Self { backend })
    }

    /// Wrap an existing backend (used by tests to inject a MemoryStore).
    pub fn with_backend(backend: Arc<dyn AppStore>) -> Self {
        Self { backend }
    }

    pub async fn set_nx_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<bool> {
        self.backend.set_nx_ex(key, value, ttl_seconds).await
    }

    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.backend.get(key).await
    }

    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> StoreResult<()> {
        self.backend.set(key, value, ttl_seconds).await
    }

    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        self.backend.remove(key).await
    }

    pub async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.backend.keys(pattern).await
    }

    pub async fn push_back(&self, queue: &str, value: &str) -> StoreResult<()> {
        self.backend.push_back(queue, value).await
    }

    pub async fn pop_front(&self, queue: &str) -> StoreResult<Option<String>> {
        self.backend.pop_front(queue).await
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.backend.ping().await
    }
}
