//! Compiled-in defaults and connection options for the cache layer

/// Default host of the key-value store server
pub const DEFAULT_CACHE_HOST: &str = "127.0.0.1";

/// Default port of the key-value store server
pub const DEFAULT_CACHE_PORT: u16 = 6379;

/// Default database index
pub const DEFAULT_CACHE_DB: u8 = 0;

/// Default TTL in seconds applied when no explicit duration is given
pub const DEFAULT_CACHE_DURATION: u64 = 60;

/// Maximum length of a cache key, in characters; longer keys are truncated
pub const MAX_CACHE_KEY_LENGTH: usize = 256;

/// Renders the default connection URL (`redis://127.0.0.1:6379/0`)
pub fn default_cache_url() -> String {
    format!(
        "redis://{}:{}/{}",
        DEFAULT_CACHE_HOST, DEFAULT_CACHE_PORT, DEFAULT_CACHE_DB
    )
}

/// Options accepted by [`CacheConnection::connect`](super::CacheConnection::connect)
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Connection URL in `scheme://host:port/dbIndex` form
    pub url: String,
    /// Default TTL in seconds for writes that do not specify one
    pub duration: u64,
    /// Whether to flush the whole database right after connecting
    pub empty_db: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            url: default_cache_url(),
            duration: DEFAULT_CACHE_DURATION,
            empty_db: true,
        }
    }
}

impl ConnectOptions {
    /// Creates options with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the connection URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Overrides the default TTL in seconds
    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    /// Keeps existing entries instead of flushing the database on connect
    pub fn keep_existing_entries(mut self) -> Self {
        self.empty_db = false;
        self
    }
}
