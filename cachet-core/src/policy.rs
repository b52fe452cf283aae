//! Cache policy types.
//!
//! - [`CachePolicy`] - A complete policy, as stored in a default table
//! - [`CacheOverride`] - A partial, per-call override
//! - [`ResolvedPolicy`] - The decision a read acts on
//!
//! Resolution order is call-site override, then the default policy for the
//! request, then "no caching". Fields merge one by one, so an override that
//! only sets `key` keeps the default TTL.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn enabled_by_default() -> bool {
    true
}

/// Caching policy for a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Time-to-live (e.g. "3m", "10m"). `None` means do not cache.
    #[serde(default, with = "humantime_serde")]
    pub ttl: Option<Duration>,
    /// Explicit opt-out that wins over any TTL.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Caller-supplied key bypassing derivation.
    #[serde(default)]
    pub explicit_key: Option<String>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: None,
            enabled: true,
            explicit_key: None,
        }
    }
}

impl CachePolicy {
    /// Policy caching for `ttl`.
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    /// Policy that never caches.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Merges an optional default with an optional per-call override.
    pub fn merge(default: Option<&CachePolicy>, call: Option<&CacheOverride>) -> CachePolicy {
        let base = default.cloned().unwrap_or_default();
        let Some(call) = call else {
            return base;
        };
        CachePolicy {
            ttl: call.ttl.or(base.ttl),
            enabled: call.enabled.unwrap_or(base.enabled),
            explicit_key: call.key.clone().or(base.explicit_key),
        }
    }

    /// Turns the policy into a decision. A zero TTL counts as no TTL.
    pub fn resolve(&self) -> ResolvedPolicy {
        match self.ttl {
            Some(ttl) if self.enabled && !ttl.is_zero() => ResolvedPolicy::Cache {
                ttl,
                key: self.explicit_key.clone(),
            },
            _ => ResolvedPolicy::Bypass,
        }
    }
}

/// Per-call cache override. Unset fields fall back to the default policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheOverride {
    /// Time-to-live override.
    #[serde(default, with = "humantime_serde")]
    pub ttl: Option<Duration>,
    /// `Some(false)` disables caching for this call.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Explicit key for this call.
    #[serde(default)]
    pub key: Option<String>,
}

impl CacheOverride {
    /// Override caching this call for `ttl`.
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    /// Override bypassing the cache for this call.
    pub fn disabled() -> Self {
        Self {
            enabled: Some(false),
            ..Self::default()
        }
    }

    /// Override storing this call under `key`.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Sets the TTL.
    pub fn with_ttl(self, ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..self
        }
    }

    /// Sets the explicit key.
    pub fn with_key(self, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..self
        }
    }
}

/// What a read should do with the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPolicy {
    /// Go straight to the network.
    Bypass,
    /// Serve from and populate the cache.
    Cache {
        /// Entry TTL.
        ttl: Duration,
        /// Explicit key, when the caller supplied one.
        key: Option<String>,
    },
}

impl ResolvedPolicy {
    /// Returns `true` for [`ResolvedPolicy::Bypass`].
    pub fn is_bypass(&self) -> bool {
        matches!(self, ResolvedPolicy::Bypass)
    }
}
