//! Metrics declaration and recording.
//!
//! Counters are only registered with the `metrics` feature; without it every
//! recording function is an empty inline function.

use cachet_core::CacheStatus;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of reads served from cache.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cachet_cache_hit_total",
            "Total number of reads served from cache."
        );
        "cachet_cache_hit_total"
    };
    /// Track number of reads fetched and stored.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cachet_cache_miss_total",
            "Total number of reads that missed the cache."
        );
        "cachet_cache_miss_total"
    };
    /// Track number of reads that skipped the cache.
    pub static ref CACHE_BYPASS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cachet_cache_bypass_total",
            "Total number of reads with caching disabled."
        );
        "cachet_cache_bypass_total"
    };
    /// Track number of entries dropped by invalidation.
    pub static ref CACHE_INVALIDATED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cachet_cache_invalidated_total",
            "Total number of cache entries dropped by invalidation."
        );
        "cachet_cache_invalidated_total"
    };
    /// Track token refresh attempts by outcome.
    pub static ref SESSION_REFRESH_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cachet_session_refresh_total",
            "Total number of token refresh attempts."
        );
        "cachet_session_refresh_total"
    };
}

/// Counts one read with `status`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_status(status: CacheStatus) {
    let name = match status {
        CacheStatus::Hit => *CACHE_HIT_COUNTER,
        CacheStatus::Miss => *CACHE_MISS_COUNTER,
        CacheStatus::Bypass => *CACHE_BYPASS_COUNTER,
    };
    metrics::counter!(name).increment(1);
}

/// Counts one read with `status`.
#[cfg(not(feature = "metrics"))]
#[inline(always)]
pub fn record_status(_status: CacheStatus) {}

/// Counts `removed` invalidated entries.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_invalidation(removed: usize) {
    metrics::counter!(*CACHE_INVALIDATED_COUNTER).increment(removed as u64);
}

/// Counts `removed` invalidated entries.
#[cfg(not(feature = "metrics"))]
#[inline(always)]
pub fn record_invalidation(_removed: usize) {}

/// Counts one refresh attempt.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_refresh(outcome: &'static str) {
    metrics::counter!(*SESSION_REFRESH_COUNTER, "outcome" => outcome).increment(1);
}

/// Counts one refresh attempt.
#[cfg(not(feature = "metrics"))]
#[inline(always)]
pub fn record_refresh(_outcome: &'static str) {}
