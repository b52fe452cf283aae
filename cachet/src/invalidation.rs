//! Which cached reads a successful mutation purges.

use serde::{Deserialize, Serialize};

/// Mutations under `trigger` purge reads under each `purge` prefix.
///
/// Both sides are substring matches: `trigger` against the mutation path,
/// `purge` against the path component of cached keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationRule {
    /// Mutation path substring.
    pub trigger: String,
    /// Path substrings of reads to drop.
    pub purge: Vec<String>,
}

impl InvalidationRule {
    /// Rule for `trigger` purging `purge`.
    pub fn new<I, S>(trigger: impl Into<String>, purge: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trigger: trigger.into(),
            purge: purge.into_iter().map(Into::into).collect(),
        }
    }

    /// Rule where mutations under `prefix` purge reads under `prefix`.
    pub fn purge_self(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            purge: vec![prefix.clone()],
            trigger: prefix,
        }
    }
}

/// Invalidation rules shipped with the client.
pub fn default_rules() -> Vec<InvalidationRule> {
    [
        "/api/v1/template",
        "/api/v1/coulduser",
        "/api/v1/couldfile",
        "/api/v1/couldsync",
    ]
    .into_iter()
    .map(InvalidationRule::purge_self)
    .collect()
}

/// Ordered rule list; the first rule whose trigger matches wins.
#[derive(Debug, Clone, Default)]
pub struct InvalidationRouter {
    rules: Vec<InvalidationRule>,
}

impl InvalidationRouter {
    /// Router over `rules`, in match order.
    pub fn new(rules: Vec<InvalidationRule>) -> Self {
        Self { rules }
    }

    /// Prefixes to purge after a successful mutation of `path`.
    pub fn routes_for(&self, path: &str) -> &[String] {
        self.rules
            .iter()
            .find(|rule| path.contains(rule.trigger.as_str()))
            .map(|rule| rule.purge.as_slice())
            .unwrap_or_default()
    }

    /// Configured rules.
    pub fn rules(&self) -> &[InvalidationRule] {
        &self.rules
    }
}

/// Named groups of cached reads for manual purging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// User profile and relationship reads.
    User,
    /// File listing reads.
    File,
    /// Sync configuration reads.
    Config,
    /// Template reads.
    Template,
    /// Every entry.
    All,
}

impl Category {
    /// Path prefix of the category, `None` for [`Category::All`].
    pub const fn prefix(&self) -> Option<&'static str> {
        match self {
            Category::User => Some("/api/v1/coulduser"),
            Category::File => Some("/api/v1/couldfile"),
            Category::Config => Some("/api/v1/couldsync"),
            Category::Template => Some("/api/v1/template"),
            Category::All => None,
        }
    }
}
