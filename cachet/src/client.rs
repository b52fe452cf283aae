//! The caching API client.

use std::sync::Arc;
use std::time::Duration;

use cachet_backend::{Backend, CacheStats, ClearScope, MemoryBackend};
use cachet_core::{CacheContext, CacheKey, CacheStatus, KeyCodec, ResolvedPolicy};
use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::invalidation::{Category, InvalidationRouter};
use crate::metrics;
use crate::policy::PolicyTable;
use crate::request::{ApiRequest, RequestConfig};
use crate::transport::Pipeline;

/// API client that caches reads and invalidates them on writes.
///
/// Reads go through the policy table: a cached fresh payload is returned
/// without touching the network, otherwise the request is sent and a
/// successful payload stored. Successful `post`/`put`/`delete` calls purge
/// the prefixes their path routes to.
///
/// Faults of the store never fail a call. They are logged and the call
/// continues as if the cache were empty.
pub struct CachingClient<B = MemoryBackend> {
    backend: Arc<B>,
    pipeline: Pipeline,
    policies: PolicyTable,
    router: InvalidationRouter,
    success_code: i64,
    default_ttl: Duration,
}

impl<B> Clone for CachingClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            pipeline: self.pipeline.clone(),
            policies: self.policies.clone(),
            router: self.router.clone(),
            success_code: self.success_code,
            default_ttl: self.default_ttl,
        }
    }
}

impl<B> std::fmt::Debug for CachingClient<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingClient")
            .field("pipeline", &self.pipeline)
            .field("policies", &self.policies.len())
            .field("rules", &self.router.rules().len())
            .field("success_code", &self.success_code)
            .finish_non_exhaustive()
    }
}

impl CachingClient<MemoryBackend> {
    /// Starts a client over `pipeline` with an in-memory store and the
    /// default configuration.
    pub fn builder(pipeline: Pipeline) -> CachingClientBuilder<MemoryBackend> {
        CachingClientBuilder::new(pipeline, MemoryBackend::new())
    }
}

impl<B> CachingClient<B>
where
    B: Backend + 'static,
{
    /// Cached read.
    pub async fn get<T>(&self, path: &str, config: RequestConfig) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_with_status(path, config)
            .await
            .map(|(value, _)| value)
    }

    /// Cached read that also reports how it was served.
    pub async fn get_with_status<T>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<(T, CacheContext), ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let method = Method::GET;
        let ResolvedPolicy::Cache { ttl, key } =
            self.policies.resolve(&method, path, config.cache.as_ref())
        else {
            debug!(path, "cache bypass");
            metrics::record_status(CacheStatus::Bypass);
            let data = self.fetch(method, path, &config).await?;
            return Ok((decode(data)?, CacheContext::bypass()));
        };

        let key = match key {
            Some(key) => CacheKey::explicit(key),
            None => KeyCodec::derive(
                &method,
                path,
                config.params.as_ref(),
                config.data.as_ref(),
                config.key_headers(),
            ),
        };

        if let Some(value) = self.lookup::<T>(&key).await {
            debug!(path, %key, "cache hit");
            metrics::record_status(CacheStatus::Hit);
            return Ok((value, CacheContext::keyed(CacheStatus::Hit, key)));
        }

        metrics::record_status(CacheStatus::Miss);
        let data = self.fetch(method, path, &config).await?;
        let value = decode::<T>(data.clone())?;
        self.store(&key, data, ttl).await;
        Ok((value, CacheContext::keyed(CacheStatus::Miss, key)))
    }

    /// Sends a POST and invalidates on success.
    pub async fn post<T>(&self, path: &str, config: RequestConfig) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.mutate(Method::POST, path, config).await
    }

    /// Sends a PUT and invalidates on success.
    pub async fn put<T>(&self, path: &str, config: RequestConfig) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.mutate(Method::PUT, path, config).await
    }

    /// Sends a DELETE and invalidates on success.
    pub async fn delete<T>(&self, path: &str, config: RequestConfig) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.mutate(Method::DELETE, path, config).await
    }

    async fn mutate<T>(&self, method: Method, path: &str, config: RequestConfig) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let data = self.fetch(method.clone(), path, &config).await?;
        for prefix in self.router.routes_for(path) {
            self.purge(&method, path, prefix).await;
        }
        decode(data)
    }

    async fn fetch(
        &self,
        method: Method,
        path: &str,
        config: &RequestConfig,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::from_config(method, path, config);
        self.pipeline
            .send(request)
            .await?
            .into_data(self.success_code)
    }

    async fn lookup<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let entry = match self.backend.get(key).await {
            Ok(entry) => entry?,
            Err(error) => {
                warn!(backend = self.backend.name(), %key, %error, "cache read failed");
                return None;
            }
        };

        match serde_json::from_value(entry.into_value()) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(%key, %error, "cached payload does not decode, evicting");
                if let Err(error) = self.backend.remove(key).await {
                    warn!(backend = self.backend.name(), %key, %error, "cache evict failed");
                }
                None
            }
        }
    }

    async fn store(&self, key: &CacheKey, value: Value, ttl: Duration) {
        match self.backend.set(key, value, ttl).await {
            Ok(()) => debug!(%key, ttl = ?ttl, "cache store"),
            Err(error) => {
                warn!(backend = self.backend.name(), %key, %error, "cache write failed");
            }
        }
    }

    async fn purge(&self, method: &Method, path: &str, prefix: &str) {
        match self
            .backend
            .clear(ClearScope::PathContains(prefix.to_owned()))
            .await
        {
            Ok(removed) => {
                debug!(%method, path, prefix, removed, "cache invalidated");
                metrics::record_invalidation(removed);
            }
            Err(error) => {
                warn!(backend = self.backend.name(), prefix, %error, "cache invalidation failed");
            }
        }
    }

    /// Drops every entry, or those whose key contains `pattern`.
    pub async fn clear_cache(&self, pattern: Option<&str>) -> usize {
        match self.backend.clear(ClearScope::from_pattern(pattern)).await {
            Ok(removed) => {
                debug!(pattern, removed, "cache cleared");
                removed
            }
            Err(error) => {
                warn!(backend = self.backend.name(), %error, "cache clear failed");
                0
            }
        }
    }

    /// Drops every read of `category`.
    pub async fn invalidate(&self, category: Category) -> usize {
        let scope = match category.prefix() {
            Some(prefix) => ClearScope::PathContains(prefix.to_owned()),
            None => ClearScope::All,
        };
        match self.backend.clear(scope).await {
            Ok(removed) => {
                debug!(?category, removed, "cache invalidated");
                metrics::record_invalidation(removed);
                removed
            }
            Err(error) => {
                warn!(backend = self.backend.name(), ?category, %error, "cache invalidation failed");
                0
            }
        }
    }

    /// Size and keys of the store.
    pub async fn cache_stats(&self) -> CacheStats {
        self.backend.stats().await.unwrap_or_else(|error| {
            warn!(backend = self.backend.name(), %error, "cache stats failed");
            CacheStats::default()
        })
    }

    /// Stores `value` under the explicit `key`, for `ttl` or the configured
    /// default.
    pub async fn set_cache<V>(&self, key: &str, value: &V, ttl: Option<Duration>)
    where
        V: Serialize + ?Sized,
    {
        let key = CacheKey::explicit(key);
        match serde_json::to_value(value) {
            Ok(value) => self.store(&key, value, ttl.unwrap_or(self.default_ttl)).await,
            Err(error) => warn!(%key, %error, "cache payload does not encode"),
        }
    }

    /// Reads the entry under the explicit `key`.
    pub async fn get_cache<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.lookup(&CacheKey::explicit(key)).await
    }

    /// Report of every stored entry.
    #[cfg(feature = "debug")]
    pub async fn debug_report(&self) -> crate::debug::DebugReport {
        let entries = self.backend.entries().await.unwrap_or_else(|error| {
            warn!(backend = self.backend.name(), %error, "cache entries failed");
            Vec::new()
        });
        crate::debug::DebugReport::from_entries(entries)
    }

    /// The store.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// The interceptor pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

fn decode<T>(data: Value) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(data).map_err(|error| ApiError::InvalidResponse(error.to_string()))
}

/// Builder for [`CachingClient`].
pub struct CachingClientBuilder<B> {
    backend: Arc<B>,
    pipeline: Pipeline,
    policies: PolicyTable,
    router: InvalidationRouter,
    success_code: i64,
    default_ttl: Duration,
}

impl<B> CachingClientBuilder<B> {
    fn new(pipeline: Pipeline, backend: B) -> Self {
        Self::from_arc(pipeline, Arc::new(backend))
    }

    fn from_arc(pipeline: Pipeline, backend: Arc<B>) -> Self {
        let config = ClientConfig::default();
        Self {
            backend,
            pipeline,
            policies: PolicyTable::from_rules(&config.policies),
            router: InvalidationRouter::new(config.invalidation),
            success_code: config.success_code,
            default_ttl: config.default_ttl,
        }
    }

    /// Replaces the store.
    pub fn backend<NB>(self, backend: NB) -> CachingClientBuilder<NB> {
        self.backend_arc(Arc::new(backend))
    }

    /// Replaces the store with a shared one.
    pub fn backend_arc<NB>(self, backend: Arc<NB>) -> CachingClientBuilder<NB> {
        CachingClientBuilder {
            backend,
            pipeline: self.pipeline,
            policies: self.policies,
            router: self.router,
            success_code: self.success_code,
            default_ttl: self.default_ttl,
        }
    }

    /// Applies policies, rules, success code and default TTL from `config`.
    pub fn config(mut self, config: &ClientConfig) -> Self {
        self.policies = PolicyTable::from_rules(&config.policies);
        self.router = InvalidationRouter::new(config.invalidation.clone());
        self.success_code = config.success_code;
        self.default_ttl = config.default_ttl;
        self
    }

    /// Replaces the policy table.
    pub fn policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    /// Replaces the invalidation rules.
    pub fn router(mut self, router: InvalidationRouter) -> Self {
        self.router = router;
        self
    }

    /// Finishes the client.
    pub fn build(self) -> CachingClient<B> {
        CachingClient {
            backend: self.backend,
            pipeline: self.pipeline,
            policies: self.policies,
            router: self.router,
            success_code: self.success_code,
            default_ttl: self.default_ttl,
        }
    }
}
