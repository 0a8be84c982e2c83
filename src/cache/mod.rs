//! Cache module wrapping a Redis-backed key-value store
//!
//! This module provides a [`CacheConnection`] that stores JSON-serialized
//! values with configurable TTL (time-to-live) values. Entries expire
//! passively through the store's own TTL mechanism; the connection never
//! evicts anything itself beyond explicit deletes.

mod config;
mod connection;
mod store;

pub use config::{
    default_cache_url, ConnectOptions, DEFAULT_CACHE_DB, DEFAULT_CACHE_DURATION,
    DEFAULT_CACHE_HOST, DEFAULT_CACHE_PORT, MAX_CACHE_KEY_LENGTH,
};
pub use connection::CacheConnection;
pub use store::{CacheError, CacheStore, RedisStore};
