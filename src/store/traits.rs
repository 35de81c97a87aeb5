//! AppStore trait definition.

use async_trait::async_trait;

use crate::store::StoreResult;

/// Trait for the shared key/value + queue store.
///
/// All backends must implement this trait to provide a unified interface.
/// `set_nx_ex` is the single synchronization point for the whole relay:
/// request handlers and the drain task never take in-process locks, they
/// rely on its atomicity for dedup correctness.
#[async_trait]
pub trait AppStore: Send + Sync {
    /// Atomically set a key with a TTL only if it does not exist yet.
    ///
    /// Returns `true` iff this caller created the key. Under concurrent
    /// attempts exactly one caller observes `true`.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<bool>;

    /// Get a value.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set a value, with an expiry when `ttl_seconds` is given.
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> StoreResult<()>;

    /// Remove a key.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Enumerate keys matching a glob pattern (e.g. `rules:tok:*`).
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Push a value onto the producer end of a FIFO queue.
    async fn push_back(&self, queue: &str, value: &str) -> StoreResult<()>;

    /// Non-blocking pop from the consumer end of a FIFO queue.
    async fn pop_front(&self, queue: &str) -> StoreResult<Option<String>>;

    /// Connectivity check for health probes.
    async fn ping(&self) -> StoreResult<()>;
}
