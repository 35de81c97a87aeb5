//! Redis store implementation using bb8 connection pool.
//!
//! FIFO queue semantics use `LPUSH` on the producer side and `RPOP` on the
//! consumer side, matching the persisted queue layout.

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use crate::config::RedisStoreConfig;
use crate::store::{AppStore, StoreError, StoreResult};

type RedisPool = Pool<Client>;

/// Redis-backed store with bb8 connection pool.
pub struct RedisStore {
    pool: RedisPool,
}

impl RedisStore {
    pub async fn new(config: &RedisStoreConfig) -> StoreResult<Self> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| StoreError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(std::time::Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    async fn get_conn(&self) -> StoreResult<PooledConnection<'_, Client>> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl AppStore for RedisStore {
    async fn set_nx_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<bool> {
        let mut conn = self.get_conn().await?;

        // SET key value NX EX ttl replies OK on creation, nil when the key exists.
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(conn_ref)
            .await
            .map_err(|e: RedisError| StoreError::Operation(e.to_string()))?;

        Ok(reply.is_some())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .get(key)
            .await
            .map_err(|e: RedisError| StoreError::Operation(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> StoreResult<()> {
        let mut conn = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        match ttl_seconds {
            Some(ttl) => conn_ref
                .set_ex::<_, _, ()>(key, value, ttl)
                .await
                .map_err(|e| StoreError::Operation(e.to_string())),
            None => conn_ref
                .set::<_, _, ()>(key, value)
                .await
                .map_err(|e| StoreError::Operation(e.to_string())),
        }
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .del::<_, ()>(key)
            .await
            .map_err(|e| StoreError::Operation(e.to_string()))
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        redis::cmd("KEYS")
            .arg(pattern)
            .query_async(conn_ref)
            .await
            .map_err(|e: RedisError| StoreError::Operation(e.to_string()))
    }

    async fn push_back(&self, queue: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .lpush::<_, _, ()>(queue, value)
            .await
            .map_err(|e| StoreError::Operation(e.to_string()))
    }

    async fn pop_front(&self, queue: &str) -> StoreResult<Option<String>> {
        let mut conn = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .rpop(queue, None)
            .await
            .map_err(|e: RedisError| StoreError::Operation(e.to_string()))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.get_conn().await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        redis::cmd("PING")
            .query_async::<()>(conn_ref)
            .await
            .map_err(|e: RedisError| StoreError::Operation(e.to_string()))
    }
}
