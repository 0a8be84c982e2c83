//! Declarative endpoint descriptors and the registry built from them

use std::collections::HashMap;

use reqwest::Method;

use crate::cache::DEFAULT_CACHE_DURATION;

/// Static description of one remote API operation
///
/// Caching is enabled by default; set `cache_duration` to `0` to disable it
/// for a given endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Path template, joined onto the registry base URL; may embed named
    /// `${name}` placeholders
    pub path: String,
    /// HTTP method used for the request
    pub method: Method,
    /// Cache TTL in seconds; `0` disables caching for this endpoint
    pub cache_duration: u64,
    /// Reserved for future auth branching; currently has no runtime effect
    pub is_public: bool,
}

impl Endpoint {
    /// GET endpoint with the default cache duration, marked public
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::GET,
            cache_duration: DEFAULT_CACHE_DURATION,
            is_public: true,
        }
    }

    /// Overrides the HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Overrides the cache TTL in seconds; `0` turns caching off
    pub fn cache_duration(mut self, seconds: u64) -> Self {
        self.cache_duration = seconds;
        self
    }

    /// Marks the endpoint as requiring authentication (reserved flag)
    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }
}

/// Operation name to [`Endpoint`] mapping, built once at startup
///
/// # Example
/// ```
/// use cachecall::{ApiRegistry, Endpoint};
/// use reqwest::Method;
///
/// let registry = ApiRegistry::with_base_url("https://example.com/api")
///     .register("get_articles", Endpoint::get("/articles"))
///     .register("get_one_article", Endpoint::get("/articles/${id}"))
///     .register(
///         "save_article",
///         Endpoint::get("/articles")
///             .method(Method::PUT)
///             .cache_duration(0)
///             .private(),
///     );
///
/// assert_eq!(registry.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ApiRegistry {
    base_url: String,
    endpoints: HashMap<String, Endpoint>,
}

impl ApiRegistry {
    /// Empty registry with no base URL; endpoint paths are used verbatim
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry whose endpoint paths are joined onto `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoints: HashMap::new(),
        }
    }

    /// Registers `endpoint` under `name`, replacing any previous entry
    pub fn register(mut self, name: impl Into<String>, endpoint: Endpoint) -> Self {
        self.endpoints.insert(name.into(), endpoint);
        self
    }

    /// Looks up an endpoint by its operation name
    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// Full URL template for `endpoint`: the base URL joined with its path
    pub(crate) fn url_for(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path)
    }

    /// Number of registered endpoints
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// True when no endpoint has been registered
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Iterates over the registered operation names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Endpoint)> for ApiRegistry {
    /// Collects `(name, endpoint)` pairs into a registry with no base URL
    fn from_iter<I: IntoIterator<Item = (String, Endpoint)>>(iter: I) -> Self {
        Self {
            base_url: String::new(),
            endpoints: iter.into_iter().collect(),
        }
    }
}
