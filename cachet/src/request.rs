//! Outgoing request model.

use std::time::Duration;

use cachet_core::CacheOverride;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;

/// A request as it travels through the interceptor pipeline.
///
/// `Clone` so an interceptor can keep a copy and replay it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the transport's base URL.
    pub path: String,
    /// Query parameters, a JSON object.
    pub params: Option<Value>,
    /// JSON body.
    pub data: Option<Value>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Per-call timeout enforced by the transport.
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    /// Bare request with no parameters, body or headers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: None,
            data: None,
            headers: HeaderMap::new(),
            timeout: None,
        }
    }

    /// Builds the request a client call sends for `config`.
    pub fn from_config(method: Method, path: impl Into<String>, config: &RequestConfig) -> Self {
        Self {
            method,
            path: path.into(),
            params: config.params.clone(),
            data: config.data.clone(),
            headers: config.headers.clone(),
            timeout: config.timeout,
        }
    }

    /// Sets the JSON body.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the query parameters.
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// Per-call options for [`CachingClient`](crate::CachingClient) operations.
///
/// ```
/// use std::time::Duration;
/// use cachet::{CacheOverride, RequestConfig};
/// use serde_json::json;
///
/// let config = RequestConfig::new()
///     .params(json!({"path": "/a"}))
///     .timeout(Duration::from_secs(5))
///     .cache(CacheOverride::ttl(Duration::from_secs(30)));
/// assert!(config.cache.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters.
    pub params: Option<Value>,
    /// JSON body.
    pub data: Option<Value>,
    /// Caller headers. Part of the cache key when non-empty.
    pub headers: HeaderMap,
    /// Per-call timeout.
    pub timeout: Option<Duration>,
    /// Cache override for this call.
    pub cache: Option<CacheOverride>,
}

impl RequestConfig {
    /// Empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query parameters.
    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the JSON body.
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Appends a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces all headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the cache override.
    pub fn cache(mut self, cache: CacheOverride) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Skips the cache for this call.
    pub fn no_cache(self) -> Self {
        self.cache(CacheOverride::disabled())
    }

    /// Caller headers as a key component, `None` when there are none.
    pub(crate) fn key_headers(&self) -> Option<&HeaderMap> {
        (!self.headers.is_empty()).then_some(&self.headers)
    }
}
