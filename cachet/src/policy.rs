//! Default caching policies by endpoint.

use std::collections::HashMap;
use std::time::Duration;

use cachet_core::{CacheOverride, CachePolicy, ResolvedPolicy};
use http::Method;
use serde::{Deserialize, Serialize};

fn default_method() -> Method {
    Method::GET
}

fn enabled_by_default() -> bool {
    true
}

/// One entry of the default policy table, as written in configuration.
///
/// ```yaml
/// method: GET
/// path: /api/v1/couldfile/list
/// ttl: 3m
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Request method, `GET` when omitted.
    #[serde(default = "default_method", with = "http_serde::method")]
    pub method: Method,
    /// Exact request path.
    pub path: String,
    /// Entry TTL.
    #[serde(default, with = "humantime_serde")]
    pub ttl: Option<Duration>,
    /// `false` turns caching off for the endpoint.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl PolicyRule {
    /// `GET path` cached for `ttl`.
    pub fn get(path: impl Into<String>, ttl: Duration) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            ttl: Some(ttl),
            enabled: true,
        }
    }

    fn policy(&self) -> CachePolicy {
        CachePolicy {
            ttl: self.ttl,
            enabled: self.enabled,
            explicit_key: None,
        }
    }
}

/// Endpoint policies shipped with the client.
pub fn default_rules() -> Vec<PolicyRule> {
    const MINUTE: u64 = 60;
    [
        ("/api/v1/coulduser/userinfo", 10),
        ("/api/v1/couldfile/list", 3),
        ("/api/v1/template/list", 30),
        ("/api/v1/couldsync/config", 5),
        ("/api/v1/coulduser/relationshiplist", 15),
        ("/api/v1/coulduser/userlist", 10),
    ]
    .into_iter()
    .map(|(path, minutes)| PolicyRule::get(path, Duration::from_secs(minutes * MINUTE)))
    .collect()
}

/// Lookup of default policies by exact `(method, path)`.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    entries: HashMap<(Method, String), CachePolicy>,
}

impl PolicyTable {
    /// Empty table; nothing is cached without a per-call override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table built from `rules`. Later rules for the same endpoint win.
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a PolicyRule>) -> Self {
        let entries = rules
            .into_iter()
            .map(|rule| ((rule.method.clone(), rule.path.clone()), rule.policy()))
            .collect();
        Self { entries }
    }

    /// Sets the policy for an endpoint.
    pub fn insert(&mut self, method: Method, path: impl Into<String>, policy: CachePolicy) {
        self.entries.insert((method, path.into()), policy);
    }

    /// Default policy for an endpoint.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&CachePolicy> {
        self.entries.get(&(method.clone(), path.to_owned()))
    }

    /// Merges the endpoint default with `call` and decides what to do.
    pub fn resolve(
        &self,
        method: &Method,
        path: &str,
        call: Option<&CacheOverride>,
    ) -> ResolvedPolicy {
        CachePolicy::merge(self.lookup(method, path), call).resolve()
    }

    /// Number of endpoints with a default policy.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no endpoint has a default policy.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
