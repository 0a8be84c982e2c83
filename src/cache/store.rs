//! Key-value store abstraction and its Redis implementation

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;

/// Errors that can occur in the cache layer
#[derive(Debug, Error)]
pub enum CacheError {
    /// Underlying store command or connection failed
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// Cached payload could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Minimal async surface the cache layer needs from a key-value store
///
/// Mirrors the wire commands in use: SET (with optional EX), GET, EXISTS,
/// DEL and FLUSHDB. Implemented by [`RedisStore`] in production and by
/// in-memory fakes in tests.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stores `value` under `key`; a `ttl` of `Some(secs)` sets an expiry,
    /// `None` persists the entry until it is deleted or evicted
    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), CacheError>;

    /// Fetches the raw value stored under `key`, or `None` if absent
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Reports whether `key` currently exists
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Removes `key`; succeeds whether or not the key exists
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Removes every entry in the current database
    async fn flush_db(&self) -> Result<(), CacheError>;
}

/// [`CacheStore`] backed by a Redis server
///
/// Holds a `ConnectionManager`, which multiplexes commands over a single
/// connection and transparently reconnects after transport failures.
#[derive(Clone)]
pub struct RedisStore {
    manager: redis::aio::ConnectionManager,
}

impl RedisStore {
    /// Opens a client for `url` and establishes the managed connection
    ///
    /// Fails if the server cannot be reached or the URL is malformed.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), CacheError> {
        let mut con = self.manager.clone();
        match ttl {
            Some(seconds) => {
                let _: () = con.set_ex(key, value, seconds).await?;
            }
            None => {
                let _: () = con.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut con = self.manager.clone();
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut con = self.manager.clone();
        let count: i64 = con.exists(key).await?;
        Ok(count > 0)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut con = self.manager.clone();
        let _: () = con.del(key).await?;
        Ok(())
    }

    async fn flush_db(&self) -> Result<(), CacheError> {
        let mut con = self.manager.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut con).await?;
        Ok(())
    }
}
