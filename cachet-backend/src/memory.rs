//! In-memory backend implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cachet_core::{CacheEntry, CacheKey};
use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;
use tracing::trace;

use crate::backend::{Backend, BackendResult, CacheStats, ClearScope, EntryInfo};

/// In-memory TTL store backed by a [`DashMap`].
///
/// Cloning is cheap and every clone shares the same entries, so one store can
/// be handed to several clients.
///
/// # Caveats
///
/// - Entries are **not persisted** and **not shared** across processes
/// - There is no capacity bound; expired entries are dropped when read or
///   cleared, never by a background task
///
/// ```
/// use cachet_backend::{Backend, MemoryBackend};
/// use cachet_core::CacheKey;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), cachet_backend::BackendError> {
/// let backend = MemoryBackend::new();
/// let key = CacheKey::explicit("greeting");
/// backend.set(&key, "hello".into(), Duration::from_secs(60)).await?;
/// assert!(backend.get(&key).await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    entries: Arc<DashMap<CacheKey, CacheEntry<Value>>>,
}

impl MemoryBackend {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones not yet evicted included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Value>>> {
        let now = Instant::now();
        if let Some(guard) = self.entries.get(key)
            && guard.is_fresh_at(now)
        {
            return Ok(Some(CacheEntry::clone(&guard)));
        }

        if self
            .entries
            .remove_if(key, |_, entry| !entry.is_fresh_at(now))
            .is_some()
        {
            trace!(%key, "evicted expired entry");
        }
        Ok(None)
    }

    async fn set(&self, key: &CacheKey, value: Value, ttl: Duration) -> BackendResult<()> {
        self.entries.insert(key.clone(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn clear(&self, scope: ClearScope) -> BackendResult<usize> {
        if scope == ClearScope::All {
            let removed = self.entries.len();
            self.entries.clear();
            return Ok(removed);
        }

        let mut removed = 0;
        self.entries.retain(|key, _| {
            let keep = !scope.matches(key);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    async fn stats(&self) -> BackendResult<CacheStats> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .map(|entry| entry.key().as_str().to_owned())
            .collect();
        keys.sort();
        Ok(CacheStats {
            size: keys.len(),
            keys,
        })
    }

    async fn entries(&self) -> BackendResult<Vec<EntryInfo>> {
        let now = Instant::now();
        let mut entries: Vec<EntryInfo> = self
            .entries
            .iter()
            .map(|entry| EntryInfo {
                key: entry.key().clone(),
                age: entry.value().age_at(now),
                ttl: entry.value().ttl(),
                fresh: entry.value().is_fresh_at(now),
            })
            .collect();
        entries.sort_by(|a, b| a.key.as_str().cmp(b.key.as_str()));
        Ok(entries)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
