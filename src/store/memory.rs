//! In-memory store implementation.
//!
//! Backs tests and single-process development runs. Expiry is lazy: expired
//! entries are discarded when touched by a read or an atomic set.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::store::{AppStore, StoreError, StoreResult};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    queues: HashMap<String, VecDeque<String>>,
}

/// In-process store with lazy TTL expiry and FIFO queues.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Minimal glob matcher supporting `*` (any run of characters).
fn glob_match(pattern: &str, text: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == text,
        Some((prefix, rest)) => {
            if !text.starts_with(prefix) {
                return false;
            }
            let remainder = &text[prefix.len()..];
            if rest.is_empty() {
                return true;
            }
            (0..=remainder.len()).any(|i| glob_match(rest, &remainder[i..]))
        }
    }
}

#[async_trait]
impl AppStore for MemoryStore {
    async fn set_nx_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<bool> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Operation(e.to_string()))?;

        if let Some(entry) = inner.entries.get(key) {
            if !entry.expired() {
                return Ok(false);
            }
        }

        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_seconds)),
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Operation(e.to_string()))?;

        match inner.entries.get(key) {
            Some(entry) if entry.expired() => {
                inner.entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> StoreResult<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Operation(e.to_string()))?;

        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl_seconds.map(|ttl| Instant::now() + Duration::from_secs(ttl)),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Operation(e.to_string()))?;

        inner.entries.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Operation(e.to_string()))?;

        Ok(inner
            .entries
            .iter()
            .filter(|(key, entry)| !entry.expired() && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn push_back(&self, queue: &str, value: &str) -> StoreResult<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Operation(e.to_string()))?;

        inner
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    async fn pop_front(&self, queue: &str) -> StoreResult<Option<String>> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Operation(e.to_string()))?;

        Ok(inner
            .queues
            .get_mut(queue)
            .and_then(|entries| entries.pop_front()))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
