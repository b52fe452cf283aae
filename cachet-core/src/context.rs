//! Cache context types for reporting how a read was served.

use crate::key::CacheKey;

/// Whether a read was served from cache, fetched, or never looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// Fresh cached data was returned without a network call.
    Hit,
    /// No fresh data was cached; the response was fetched and stored.
    #[default]
    Miss,
    /// Caching does not apply to this read.
    Bypass,
}

impl CacheStatus {
    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Bypass => "bypass",
        }
    }
}

/// Outcome of a single read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheContext {
    /// How the read was served.
    pub status: CacheStatus,
    /// Key the read was looked up under, absent on bypass.
    pub key: Option<CacheKey>,
}

impl CacheContext {
    /// Context for a read that skipped the cache.
    pub fn bypass() -> Self {
        Self {
            status: CacheStatus::Bypass,
            key: None,
        }
    }

    /// Context for a read looked up under `key`.
    pub fn keyed(status: CacheStatus, key: CacheKey) -> Self {
        Self {
            status,
            key: Some(key),
        }
    }
}
