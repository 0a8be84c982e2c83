//! Cachecall - a cache-aside HTTP API client
//!
//! Sits between application callers and a remote HTTP API, transparently
//! deduplicating identical requests through a Redis-backed TTL cache.
//! Endpoints are registered declaratively and invoked by name; each call
//! checks the cache before touching the network, and writes fresh results
//! back without blocking the caller.
//!
//! Calls never fail with an error: every failure path folds into a `false`
//! result, so callers branch on [`CallOutcome::is_success`] instead of
//! handling exceptions.
//!
//! ```no_run
//! use cachecall::{
//!     ApiClient, ApiRegistry, CallArgs, CacheConnection, ConnectOptions, Endpoint, Params,
//! };
//! use reqwest::Method;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), cachecall::CacheError> {
//! let cache = CacheConnection::connect(ConnectOptions::default()).await?;
//!
//! let registry = ApiRegistry::with_base_url("https://example.com/api")
//!     .register("get_articles", Endpoint::get("/articles"))
//!     .register("get_one_article", Endpoint::get("/articles/${id}"))
//!     .register(
//!         "save_article",
//!         Endpoint::get("/articles")
//!             .method(Method::PUT)
//!             .cache_duration(0)
//!             .private(),
//!     );
//!
//! let client = ApiClient::new(registry, cache);
//!
//! // Served from cache within the endpoint's TTL after the first call
//! let articles = client.call("get_articles", CallArgs::new()).await;
//!
//! let params = Params::named([("id", 123)]);
//! let article = client
//!     .call("get_one_article", CallArgs::new().with_params(params))
//!     .await;
//!
//! // Never cached: the endpoint's cache duration is 0
//! let saved = client
//!     .call("save_article", CallArgs::new().with_body(json!({"key": "value"})))
//!     .await;
//!
//! if saved.is_success() {
//!     println!("saved: {}", saved.result);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;

pub use api::{
    ApiClient, ApiRegistry, CallArgs, CallOutcome, Endpoint, HttpTransport, Params,
    ReqwestTransport, TransportError, TransportResponse,
};
pub use cache::{CacheConnection, CacheError, CacheStore, ConnectOptions, RedisStore};
