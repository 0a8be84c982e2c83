//! Cache-aside dispatcher for registered endpoints
//!
//! Each call resolves its URL from the endpoint's path template, consults
//! the cache, and only reaches the network on a miss. Fresh results are
//! written back with the endpoint's TTL without blocking the caller.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cache::{CacheConnection, MAX_CACHE_KEY_LENGTH};

use super::endpoint::{ApiRegistry, Endpoint};
use super::transport::{HttpTransport, ReqwestTransport, TransportResponse};
use super::url::{format_url_with_params, Params};

const HTTP_STATUS_OK: u16 = 200;
const HTTP_STATUS_CREATED: u16 = 201;
const HTTP_STATUS_ACCEPTED: u16 = 202;
const HTTP_STATUS_NO_CONTENT: u16 = 204;

/// Optional arguments for one endpoint call
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    /// Path and query parameters
    pub params: Option<Params>,
    /// JSON request body; attached only for non-GET methods
    pub body: Option<Value>,
}

impl CallArgs {
    /// Arguments with neither parameters nor body
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches path/query parameters
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Attaches a JSON request body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Outcome of one endpoint call
///
/// `result` is the logical payload: the response's `data` field on a 2xx
/// status, `true` for 204, the cached value on a hit, and `false` on every
/// failure path. `response` carries the parsed response body when one
/// exists; a cache hit has none, because no request was made. `status`
/// reports the HTTP status when a live request reached the server.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    /// Logical result of the call
    pub result: Value,
    /// Parsed response body, when a request was made and a body was parsed
    pub response: Option<Value>,
    /// HTTP status of the live response, when a request was made
    pub status: Option<u16>,
}

impl CallOutcome {
    /// True when the call yielded usable data
    ///
    /// Callers must branch on this (or on `result`) to detect failure;
    /// [`ApiClient::call`] never returns an error. A `null` result (a
    /// success response without a `data` field) also counts as no usable
    /// data.
    pub fn is_success(&self) -> bool {
        !matches!(self.result, Value::Bool(false) | Value::Null)
    }

    fn failure() -> Self {
        Self {
            result: Value::Bool(false),
            response: None,
            status: None,
        }
    }

    fn cached(result: Value) -> Self {
        Self {
            result,
            response: None,
            status: None,
        }
    }
}

/// Dispatches calls to registered endpoints through the cache-aside protocol
///
/// The cache connection is an explicit dependency rather than process-global
/// state; clones share the registry, the cache connection and the transport.
///
/// # Example
/// ```no_run
/// use cachecall::{ApiClient, ApiRegistry, CallArgs, CacheConnection, ConnectOptions, Endpoint, Params};
///
/// # async fn run() -> Result<(), cachecall::CacheError> {
/// let cache = CacheConnection::connect(ConnectOptions::default()).await?;
/// let registry = ApiRegistry::with_base_url("https://example.com/api")
///     .register("get_one_article", Endpoint::get("/articles/${id}"));
/// let client = ApiClient::new(registry, cache);
///
/// let params = Params::named([("id", 123)]);
/// let outcome = client.call("get_one_article", CallArgs::new().with_params(params)).await;
/// if outcome.is_success() {
///     println!("{}", outcome.result);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    registry: Arc<ApiRegistry>,
    cache: CacheConnection,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    /// Client using the shared reqwest transport
    pub fn new(registry: ApiRegistry, cache: CacheConnection) -> Self {
        Self::with_transport(registry, cache, Arc::new(ReqwestTransport::new()))
    }

    /// Client with an injected transport implementation
    pub fn with_transport(
        registry: ApiRegistry,
        cache: CacheConnection,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            cache,
            transport,
        }
    }

    /// Calls the endpoint registered under `name`
    ///
    /// Never fails: every failure path, from an unregistered name to a
    /// transport error, folds into a `false` result. A cache hit returns
    /// immediately without touching the network; a miss performs the
    /// request and schedules a detached cache write before returning.
    pub async fn call(&self, name: &str, args: CallArgs) -> CallOutcome {
        let Some(endpoint) = self.registry.get(name) else {
            warn!(name, "call to unregistered endpoint");
            return CallOutcome::failure();
        };

        let url = self.registry.url_for(endpoint);
        if url.is_empty() {
            warn!(name, "endpoint has no URL");
            return CallOutcome::failure();
        }

        let api_url = format_url_with_params(&url, args.params.as_ref());
        let body_string = args.body.as_ref().map(Value::to_string).unwrap_or_default();
        let cache_key = build_cache_key(&api_url, &body_string);

        if endpoint.cache_duration > 0 && self.probe_cache(&cache_key).await {
            if let Some(cached) = self.read_cache(&cache_key).await {
                debug!(name, key = %cache_key, "cache hit");
                return CallOutcome::cached(cached);
            }
            // The key vanished between the existence check and the read
            // (TTL expiry race); fetch fresh data instead.
            debug!(name, key = %cache_key, "cache entry expired between lookup and read");
        }

        self.fetch_and_cache(name, endpoint, &api_url, body_string, cache_key)
            .await
    }

    /// Existence check that degrades to a miss when the store is unavailable
    async fn probe_cache(&self, key: &str) -> bool {
        match self.cache.has_element(key).await {
            Ok(present) => present,
            Err(e) => {
                warn!(key, error = %e, "cache lookup failed, treating as miss");
                false
            }
        }
    }

    async fn read_cache(&self, key: &str) -> Option<Value> {
        match self.cache.get_element(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "cache read failed");
                None
            }
        }
    }

    async fn fetch_and_cache(
        &self,
        name: &str,
        endpoint: &Endpoint,
        url: &str,
        body_string: String,
        cache_key: String,
    ) -> CallOutcome {
        let body = if body_string.is_empty() {
            None
        } else {
            Some(body_string)
        };

        let response = match self
            .transport
            .execute(endpoint.method.clone(), url, body)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(name, url, error = %e, "request failed");
                return CallOutcome::failure();
            }
        };

        debug!(name, url, status = response.status, "api call completed");
        let (outcome, cacheable) = classify_response(&response);

        if cacheable && endpoint.cache_duration > 0 {
            // Detached write: the caller gets its result without waiting for
            // the store. A write lost to a crash only costs a future miss.
            let cache = self.cache.clone();
            let result = outcome.result.clone();
            let duration = endpoint.cache_duration;
            tokio::spawn(async move {
                if let Err(e) = cache.add_element(&cache_key, &result, Some(duration)).await {
                    warn!(key = %cache_key, error = %e, "cache write failed");
                }
            });
        }

        outcome
    }
}

/// Cache key for a resolved URL and serialized body
///
/// The key is `url + "+" + body`, truncated to [`MAX_CACHE_KEY_LENGTH`]
/// characters; inputs agreeing on that prefix collide by design.
fn build_cache_key(url: &str, body: &str) -> String {
    format!("{}+{}", url, body)
        .chars()
        .take(MAX_CACHE_KEY_LENGTH)
        .collect()
}

/// Maps an HTTP response to its logical outcome
///
/// Returns the outcome and whether it may be written to the cache; a body
/// that fails to parse is never cached.
fn classify_response(response: &TransportResponse) -> (CallOutcome, bool) {
    match response.status {
        HTTP_STATUS_NO_CONTENT => (
            CallOutcome {
                result: Value::Bool(true),
                response: None,
                status: Some(response.status),
            },
            true,
        ),
        HTTP_STATUS_OK | HTTP_STATUS_CREATED | HTTP_STATUS_ACCEPTED => {
            match serde_json::from_str::<Value>(&response.body) {
                Ok(parsed) => {
                    let result = parsed.get("data").cloned().unwrap_or(Value::Null);
                    (
                        CallOutcome {
                            result,
                            response: Some(parsed),
                            status: Some(response.status),
                        },
                        true,
                    )
                }
                Err(e) => {
                    warn!(status = response.status, error = %e, "response body is not valid JSON");
                    (
                        CallOutcome {
                            result: Value::Bool(false),
                            response: None,
                            status: Some(response.status),
                        },
                        false,
                    )
                }
            }
        }
        status => match serde_json::from_str::<Value>(&response.body) {
            Ok(parsed) => (
                CallOutcome {
                    result: Value::Bool(false),
                    response: Some(parsed),
                    status: Some(status),
                },
                true,
            ),
            Err(_) => (
                CallOutcome {
                    result: Value::Bool(false),
                    response: None,
                    status: Some(status),
                },
                false,
            ),
        },
    }
}
