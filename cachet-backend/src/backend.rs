use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cachet_core::{CacheEntry, CacheKey};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::BackendError;

pub type BackendResult<T> = Result<T, BackendError>;

/// Which entries a [`Backend::clear`] call drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearScope {
    /// Every entry.
    All,
    /// Entries whose rendered key contains the pattern.
    KeyContains(String),
    /// Entries whose path component contains the pattern.
    ///
    /// Explicit keys have no path; their rendered key is matched instead.
    PathContains(String),
}

impl ClearScope {
    /// `None` clears everything, `Some(pattern)` clears by key substring.
    pub fn from_pattern(pattern: Option<&str>) -> Self {
        match pattern {
            Some(pattern) => ClearScope::KeyContains(pattern.to_owned()),
            None => ClearScope::All,
        }
    }

    /// Returns `true` if the entry under `key` falls in this scope.
    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            ClearScope::All => true,
            ClearScope::KeyContains(pattern) => key.as_str().contains(pattern.as_str()),
            ClearScope::PathContains(pattern) => key.path_contains(pattern),
        }
    }
}

/// Read-only summary of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of stored entries, expired ones not yet evicted included.
    pub size: usize,
    /// Rendered keys of the stored entries.
    pub keys: Vec<String>,
}

/// Diagnostic view of one stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// The entry's key.
    pub key: CacheKey,
    /// Time since the entry was stored.
    pub age: Duration,
    /// The entry's time-to-live.
    pub ttl: Duration,
    /// `true` while the entry would still be served.
    pub fresh: bool,
}

/// Storage contract of the request cache.
///
/// Expiry is lazy: [`Backend::get`] must never return an expired entry and
/// deletes it when it finds one. There is no capacity bound and no
/// background sweep.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the fresh entry under `key`, `None` if absent or expired.
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Value>>>;

    /// Inserts or overwrites the entry under `key`, stored now.
    async fn set(&self, key: &CacheKey, value: Value, ttl: Duration) -> BackendResult<()>;

    /// Removes the entry under `key`, returning whether one was present.
    async fn remove(&self, key: &CacheKey) -> BackendResult<bool>;

    /// Drops every entry in `scope`, returning how many were removed.
    async fn clear(&self, scope: ClearScope) -> BackendResult<usize>;

    /// Size and keys of the store.
    async fn stats(&self) -> BackendResult<CacheStats>;

    /// Per-entry diagnostics. Does not evict.
    async fn entries(&self) -> BackendResult<Vec<EntryInfo>>;

    /// Name of this backend for logs.
    fn name(&self) -> &str {
        "backend"
    }
}

#[async_trait]
impl<B> Backend for Arc<B>
where
    B: Backend + ?Sized,
{
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Value>>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &CacheKey, value: Value, ttl: Duration) -> BackendResult<()> {
        (**self).set(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<bool> {
        (**self).remove(key).await
    }

    async fn clear(&self, scope: ClearScope) -> BackendResult<usize> {
        (**self).clear(scope).await
    }

    async fn stats(&self) -> BackendResult<CacheStats> {
        (**self).stats().await
    }

    async fn entries(&self) -> BackendResult<Vec<EntryInfo>> {
        (**self).entries().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Value>>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &CacheKey, value: Value, ttl: Duration) -> BackendResult<()> {
        (**self).set(key, value, ttl).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<bool> {
        (**self).remove(key).await
    }

    async fn clear(&self, scope: ClearScope) -> BackendResult<usize> {
        (**self).clear(scope).await
    }

    async fn stats(&self) -> BackendResult<CacheStats> {
        (**self).stats().await
    }

    async fn entries(&self) -> BackendResult<Vec<EntryInfo>> {
        (**self).entries().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Typed operations on top of [`Backend`].
///
/// Payloads go through `serde_json`. A stored payload that no longer fits
/// `T` is reported as [`BackendError::Format`].
pub trait CacheBackend: Backend {
    fn get_typed<T>(
        &self,
        key: &CacheKey,
    ) -> impl Future<Output = BackendResult<Option<T>>> + Send
    where
        T: DeserializeOwned,
    {
        async move {
            match self.get(key).await? {
                Some(entry) => Ok(Some(serde_json::from_value(entry.into_value())?)),
                None => Ok(None),
            }
        }
    }

    fn set_typed<T>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> impl Future<Output = BackendResult<()>> + Send
    where
        T: Serialize + Sync,
    {
        async move {
            let value = serde_json::to_value(value)?;
            self.set(key, value, ttl).await
        }
    }
}

impl<B> CacheBackend for B where B: Backend + ?Sized {}
