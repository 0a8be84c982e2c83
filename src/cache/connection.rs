//! Cache connection holding the store handle and the default TTL policy

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use super::config::ConnectOptions;
use super::store::{CacheError, CacheStore, RedisStore};

/// Typed handle over the key-value store, created once per process
///
/// Values are stored in their JSON string form and expire passively through
/// the store's TTL mechanism. Cloning is cheap; all clones share the same
/// underlying connection, which serializes concurrent operations itself.
///
/// # Example
/// ```no_run
/// use cachecall::{CacheConnection, ConnectOptions};
///
/// # async fn run() -> Result<(), cachecall::CacheError> {
/// let cache = CacheConnection::connect(ConnectOptions::default()).await?;
///
/// cache.add_element("my_key", &"my_value", None).await?; // TTL = 60 seconds
/// cache.add_element("my_key", &"my_value", Some(0)).await?; // never expires
/// cache.add_element("my_key", &"my_value", Some(30)).await?; // TTL = 30 seconds
/// cache.has_element("my_key").await?; // true or false
/// cache.get_element::<String>("my_key").await?; // Some("my_value")
/// cache.delete_element("my_key").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CacheConnection {
    store: Arc<dyn CacheStore>,
    default_duration: u64,
}

impl CacheConnection {
    /// Connects to the store described by `options`
    ///
    /// A connection failure is fatal to cache initialization and propagates
    /// to the caller. When `options.empty_db` is set, the whole database is
    /// flushed right after connecting, so each process starts from a cold
    /// cache. Transport errors after this point are reported per operation;
    /// the managed connection reconnects on its own.
    pub async fn connect(options: ConnectOptions) -> Result<Self, CacheError> {
        let store = RedisStore::connect(&options.url).await.inspect_err(|e| {
            error!(url = %options.url, error = %e, "cache connection failed");
        })?;

        if options.empty_db {
            store.flush_db().await?;
        }

        debug!(url = %options.url, duration = options.duration, "cache connected");
        Ok(Self {
            store: Arc::new(store),
            default_duration: options.duration,
        })
    }

    /// Wraps an existing store implementation
    ///
    /// Useful for tests or alternative store backends.
    pub fn with_store(store: Arc<dyn CacheStore>, default_duration: u64) -> Self {
        Self {
            store,
            default_duration,
        }
    }

    /// Default TTL in seconds used when `add_element` gets no explicit duration
    pub fn default_duration(&self) -> u64 {
        self.default_duration
    }

    /// Stores `value` under `key` in its JSON string form
    ///
    /// A `duration` of `None` uses the connection default; `Some(0)` stores
    /// the entry without expiry; `Some(secs)` expires it after `secs` seconds.
    pub async fn add_element<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        duration: Option<u64>,
    ) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(value)?;
        let duration = duration.unwrap_or(self.default_duration);
        let ttl = if duration > 0 { Some(duration) } else { None };
        self.store.set(key, &serialized, ttl).await
    }

    /// Fetches and deserializes the value cached under `key`
    ///
    /// Absence is a value, not an error: an empty key returns `Ok(None)`
    /// without touching the store, and a key the store does not hold returns
    /// `Ok(None)` as well.
    pub async fn get_element<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        if key.is_empty() {
            return Ok(None);
        }
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Reports whether `key` is currently present in the store
    ///
    /// An empty key returns `Ok(false)` without touching the store.
    pub async fn has_element(&self, key: &str) -> Result<bool, CacheError> {
        if key.is_empty() {
            return Ok(false);
        }
        self.store.exists(key).await
    }

    /// Removes `key` from the store; succeeds even if the key does not exist
    pub async fn delete_element(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await
    }
}
