//! Cached entries with TTL metadata.
//!
//! A [`CacheEntry`] wraps a payload with the monotonic time it was stored
//! and its time-to-live. An entry is fresh while `now - stored_at <= ttl`.
//!
//! Time is read from [`tokio::time::Instant`], so a paused test runtime
//! (`tokio::time::pause` / `advance`) drives expiry deterministically.
//!
//! ```
//! use cachet_core::CacheEntry;
//! use std::time::Duration;
//! use tokio::time::Instant;
//!
//! let stored_at = Instant::now();
//! let entry = CacheEntry::with_stored_at("user_data", stored_at, Duration::from_secs(60));
//!
//! assert!(entry.is_fresh_at(stored_at + Duration::from_secs(60)));
//! assert!(!entry.is_fresh_at(stored_at + Duration::from_secs(61)));
//! ```

use std::time::Duration;

use tokio::time::Instant;

/// A cached payload with expiry metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// Creates an entry stored now.
    pub fn new(value: T, ttl: Duration) -> Self {
        Self::with_stored_at(value, Instant::now(), ttl)
    }

    /// Creates an entry with an explicit capture time.
    pub fn with_stored_at(value: T, stored_at: Instant, ttl: Duration) -> Self {
        CacheEntry {
            value,
            stored_at,
            ttl,
        }
    }

    /// Returns a reference to the cached payload.
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns when the entry was stored.
    #[inline]
    pub fn stored_at(&self) -> Instant {
        self.stored_at
    }

    /// Returns the entry's time-to-live.
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Consumes the entry and returns the payload.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Age of the entry at `now`.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    /// Returns `true` while `now - stored_at <= ttl`.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        self.age_at(now) <= self.ttl
    }

    /// Freshness against the current time.
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    /// Time left before the entry expires, `None` once it has.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        let age = self.age_at(now);
        (age <= self.ttl).then(|| self.ttl - age)
    }

    /// Maps the payload, keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            value: f(self.value),
            stored_at: self.stored_at,
            ttl: self.ttl,
        }
    }
}
