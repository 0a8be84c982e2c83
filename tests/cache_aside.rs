//! Integration tests for the cache-aside request protocol
//!
//! Exercises the public API end-to-end with an in-memory store and a
//! scripted transport, covering the cache hit/miss branches, status
//! classification and URL resolution.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use cachecall::{
    ApiClient, ApiRegistry, CacheConnection, CacheError, CacheStore, CallArgs, Endpoint,
    HttpTransport, Params, TransportError, TransportResponse,
};

/// In-memory key-value store recording writes and lookups
#[derive(Default)]
struct FakeStore {
    entries: Mutex<HashMap<String, (String, Option<u64>)>>,
    set_calls: Mutex<Vec<(String, Option<u64>)>>,
}

#[async_trait]
impl CacheStore for FakeStore {
    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), CacheError> {
        self.set_calls.lock().unwrap().push((key.to_string(), ttl));
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(value, _)| value.clone()))
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.lock().unwrap().contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn flush_db(&self) -> Result<(), CacheError> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

/// Store reporting every key as present while reads come back empty, as
/// when an entry expires between the existence check and the read
struct VanishingStore;

#[async_trait]
impl CacheStore for VanishingStore {
    async fn set(&self, _key: &str, _value: &str, _ttl: Option<u64>) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(true)
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn flush_db(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Store whose every operation fails, as when the server is unreachable
struct FailingStore;

/// Any `CacheError` will do for a failing store
fn store_error() -> CacheError {
    serde_json::from_str::<Value>("").unwrap_err().into()
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn set(&self, _key: &str, _value: &str, _ttl: Option<u64>) -> Result<(), CacheError> {
        Err(store_error())
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(store_error())
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Err(store_error())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(store_error())
    }

    async fn flush_db(&self) -> Result<(), CacheError> {
        Err(store_error())
    }
}

/// Transport returning a scripted response and recording each request
struct FakeTransport {
    status: u16,
    body: String,
    requests: Mutex<Vec<(Method, String, Option<String>)>>,
}

impl FakeTransport {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_url(&self) -> String {
        self.requests.lock().unwrap().last().unwrap().1.clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((method, url.to_string(), body));
        Ok(TransportResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Builds a client over fakes: (client, store, transport)
fn create_test_client(
    registry: ApiRegistry,
    status: u16,
    body: &str,
) -> (ApiClient, Arc<FakeStore>, Arc<FakeTransport>) {
    let store = Arc::new(FakeStore::default());
    let transport = Arc::new(FakeTransport::new(status, body));
    let cache = CacheConnection::with_store(store.clone(), 60);
    let client = ApiClient::with_transport(registry, cache, transport.clone());
    (client, store, transport)
}

/// Waits for the detached cache write to land, up to one second
async fn wait_for_write(store: &FakeStore) {
    for _ in 0..100 {
        if !store.set_calls.lock().unwrap().is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Cache write never happened");
}

#[tokio::test]
async fn test_cache_hit_skips_the_network() {
    let registry =
        ApiRegistry::new().register("get_articles", Endpoint::get("/articles").cache_duration(10));
    let (client, store, transport) = create_test_client(registry, 200, r#"{"data":"fresh"}"#);

    // Preload the entry the call would produce
    let cache = CacheConnection::with_store(store.clone(), 60);
    cache
        .add_element("/articles+", &"cached", Some(10))
        .await
        .unwrap();

    let outcome = client.call("get_articles", CallArgs::new()).await;

    assert_eq!(outcome.result, json!("cached"));
    assert_eq!(outcome.response, None, "No live response on a cache hit");
    assert_eq!(
        transport.request_count(),
        0,
        "A cache hit must not reach the network"
    );
}

#[tokio::test]
async fn test_cache_miss_fetches_once_and_writes_once() {
    let registry =
        ApiRegistry::new().register("get_articles", Endpoint::get("/articles").cache_duration(10));
    let (client, store, transport) = create_test_client(registry, 200, r#"{"data":"fresh"}"#);

    let outcome = client.call("get_articles", CallArgs::new()).await;

    assert_eq!(outcome.result, json!("fresh"));
    assert_eq!(transport.request_count(), 1, "Exactly one request on a miss");

    wait_for_write(&store).await;
    let set_calls = store.set_calls.lock().unwrap();
    assert_eq!(set_calls.len(), 1, "Exactly one cache write on a miss");
    assert_eq!(set_calls[0], ("/articles+".to_string(), Some(10)));
}

#[tokio::test]
async fn test_zero_cache_duration_disables_caching() {
    let registry =
        ApiRegistry::new().register("save_article", Endpoint::get("/articles").method(Method::PUT).cache_duration(0));
    let (client, store, transport) = create_test_client(registry, 200, r#"{"data":"saved"}"#);

    let outcome = client.call("save_article", CallArgs::new()).await;

    assert_eq!(outcome.result, json!("saved"));
    assert_eq!(transport.request_count(), 1);

    // Give any stray detached write time to land before asserting
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(
        store.set_calls.lock().unwrap().is_empty(),
        "TTL of 0 must skip the cache entirely"
    );
}

#[tokio::test]
async fn test_no_content_status_yields_true() {
    let registry = ApiRegistry::new().register("delete_article", Endpoint::get("/articles/${id}").method(Method::DELETE).cache_duration(0));
    let (client, _store, _transport) = create_test_client(registry, 204, "");

    let params = Params::named([("id", 123)]);
    let outcome = client
        .call("delete_article", CallArgs::new().with_params(params))
        .await;

    assert_eq!(outcome.result, Value::Bool(true));
    assert_eq!(outcome.status, Some(204));
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_error_status_yields_false_with_diagnostic_body() {
    let registry = ApiRegistry::new().register("get_articles", Endpoint::get("/articles").cache_duration(0));
    let (client, _store, _transport) = create_test_client(registry, 205, r#"{"err":"Y"}"#);

    let outcome = client.call("get_articles", CallArgs::new()).await;

    assert_eq!(outcome.result, Value::Bool(false));
    assert_eq!(outcome.response, Some(json!({"err": "Y"})));
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_unregistered_endpoint_returns_failure_without_side_effects() {
    let registry = ApiRegistry::new();
    let (client, store, transport) = create_test_client(registry, 200, r#"{"data":1}"#);

    let outcome = client.call("missing_op", CallArgs::new()).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.response, None);
    assert_eq!(transport.request_count(), 0);
    assert!(store.set_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_endpoint_without_url_returns_failure_without_side_effects() {
    let registry = ApiRegistry::new().register("broken", Endpoint::get(""));
    let (client, store, transport) = create_test_client(registry, 200, r#"{"data":1}"#);

    let outcome = client.call("broken", CallArgs::new()).await;

    assert!(!outcome.is_success());
    assert_eq!(transport.request_count(), 0, "No network call without a URL");
    assert!(store.set_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_named_params_substitute_path_placeholders() {
    let registry = ApiRegistry::new().register("get_one_article", Endpoint::get("/articles/${id}").cache_duration(0));
    let (client, _store, transport) = create_test_client(registry, 200, r#"{"data":1}"#);

    let params = Params::named([("id", 123)]);
    client
        .call("get_one_article", CallArgs::new().with_params(params))
        .await;

    assert_eq!(transport.last_url(), "/articles/123");
}

#[tokio::test]
async fn test_named_params_without_placeholder_become_query_string() {
    let registry = ApiRegistry::new().register("get_articles", Endpoint::get("/articles").cache_duration(0));
    let (client, _store, transport) = create_test_client(registry, 200, r#"{"data":1}"#);

    let params = Params::named([("page", 2)]);
    client
        .call("get_articles", CallArgs::new().with_params(params))
        .await;

    assert_eq!(transport.last_url(), "/articles?page=2");
}

#[tokio::test]
async fn test_list_params_append_path_segments() {
    let registry = ApiRegistry::new().register("get_x", Endpoint::get("/x").cache_duration(0));
    let (client, _store, transport) = create_test_client(registry, 200, r#"{"data":1}"#);

    let params = Params::list(["a", "b"]);
    client
        .call("get_x", CallArgs::new().with_params(params))
        .await;

    assert_eq!(transport.last_url(), "/x/a/b");
}

#[tokio::test]
async fn test_base_url_is_joined_onto_endpoint_paths() {
    let registry = ApiRegistry::with_base_url("https://example.com/api")
        .register("get_articles", Endpoint::get("/articles").cache_duration(0));
    let (client, _store, transport) = create_test_client(registry, 200, r#"{"data":1}"#);

    client.call("get_articles", CallArgs::new()).await;

    assert_eq!(transport.last_url(), "https://example.com/api/articles");
}

#[tokio::test]
async fn test_body_is_part_of_the_cache_key() {
    let registry = ApiRegistry::new().register("save", Endpoint::get("/articles").method(Method::POST).cache_duration(10));
    let (client, store, transport) = create_test_client(registry, 200, r#"{"data":"ok"}"#);

    let body = json!({"key": "value"});
    client
        .call("save", CallArgs::new().with_body(body.clone()))
        .await;

    wait_for_write(&store).await;
    let set_calls = store.set_calls.lock().unwrap();
    assert_eq!(set_calls[0].0, format!("/articles+{}", body));

    let requests = transport.requests.lock().unwrap();
    assert_eq!(
        requests[0].2.as_deref(),
        Some(body.to_string().as_str()),
        "Body should be forwarded to the transport"
    );
}

#[tokio::test]
async fn test_long_cache_keys_are_truncated() {
    let long_path = format!("/{}", "a".repeat(300));
    let registry =
        ApiRegistry::new().register("long", Endpoint::get(long_path).cache_duration(10));
    let (client, store, _transport) = create_test_client(registry, 200, r#"{"data":1}"#);

    client.call("long", CallArgs::new()).await;

    wait_for_write(&store).await;
    let set_calls = store.set_calls.lock().unwrap();
    assert_eq!(
        set_calls[0].0.chars().count(),
        256,
        "Keys are truncated to the maximum length"
    );
}

#[tokio::test]
async fn test_second_call_is_served_from_cache() {
    let registry =
        ApiRegistry::new().register("get_articles", Endpoint::get("/articles").cache_duration(10));
    let (client, store, transport) = create_test_client(registry, 200, r#"{"data":"fresh"}"#);

    let first = client.call("get_articles", CallArgs::new()).await;
    wait_for_write(&store).await;
    let second = client.call("get_articles", CallArgs::new()).await;

    assert_eq!(first.result, json!("fresh"));
    assert_eq!(second.result, json!("fresh"));
    assert_eq!(first.status, Some(200));
    assert_eq!(second.status, None, "Second call carries no live response");
    assert_eq!(
        transport.request_count(),
        1,
        "Second call must be served from cache"
    );
}

#[tokio::test]
async fn test_entry_expiring_between_lookup_and_read_is_refetched() {
    let registry =
        ApiRegistry::new().register("get_articles", Endpoint::get("/articles").cache_duration(10));
    let transport = Arc::new(FakeTransport::new(200, r#"{"data":"fresh"}"#));
    let cache = CacheConnection::with_store(Arc::new(VanishingStore), 60);
    let client = ApiClient::with_transport(registry, cache, transport.clone());

    let outcome = client.call("get_articles", CallArgs::new()).await;

    assert_eq!(outcome.result, json!("fresh"));
    assert!(outcome.is_success());
    assert_eq!(
        transport.request_count(),
        1,
        "A vanished entry must be refetched, not reported as an empty hit"
    );
}

#[tokio::test]
async fn test_unavailable_store_degrades_to_a_miss() {
    let registry =
        ApiRegistry::new().register("get_articles", Endpoint::get("/articles").cache_duration(10));
    let transport = Arc::new(FakeTransport::new(200, r#"{"data":"fresh"}"#));
    let cache = CacheConnection::with_store(Arc::new(FailingStore), 60);
    let client = ApiClient::with_transport(registry, cache, transport.clone());

    let outcome = client.call("get_articles", CallArgs::new()).await;

    assert_eq!(outcome.result, json!("fresh"));
    assert!(outcome.is_success());
    assert_eq!(
        transport.request_count(),
        1,
        "A failing store must degrade to a miss, not break the call"
    );
}

#[tokio::test]
async fn test_failed_result_is_cached_for_error_statuses() {
    // A negative logical result is as cacheable as a positive one, as long
    // as the error body parsed as JSON.
    let registry =
        ApiRegistry::new().register("get_articles", Endpoint::get("/articles").cache_duration(10));
    let (client, store, _transport) = create_test_client(registry, 205, r#"{"err":"Y"}"#);

    client.call("get_articles", CallArgs::new()).await;

    wait_for_write(&store).await;
    let entries = store.entries.lock().unwrap();
    assert_eq!(entries.get("/articles+").unwrap().0, "false");
}
