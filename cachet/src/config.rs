//! Client configuration.
//!
//! Everything has a default, so an empty document is a valid config:
//!
//! ```yaml
//! default_ttl: 5m
//! success_code: 200
//! policies:
//!   - path: /api/v1/couldfile/list
//!     ttl: 3m
//!   - method: GET
//!     path: /api/v1/couldsync/config
//!     enabled: false
//! invalidation:
//!   - trigger: /api/v1/couldfile
//!     purge: [/api/v1/couldfile]
//! session:
//!   enable_refresh_token: true
//!   login_expired_mode: Modal
//!   locale: en-US
//!   refresh_path: /api/v1/auth/refresh
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::invalidation::{self, InvalidationRule};
use crate::policy::{self, PolicyRule};

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid YAML for [`ClientConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    /// The document parsed but a value is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// What happens when a session cannot be refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoginExpiredMode {
    /// Prompt for login in place, once the access check has completed.
    #[default]
    Modal,
    /// Log out and start over.
    Logout,
}

fn enabled() -> bool {
    true
}

fn default_locale() -> String {
    "zh-CN".to_owned()
}

fn default_refresh_path() -> String {
    "/api/v1/auth/refresh".to_owned()
}

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Refresh expired tokens instead of re-authenticating.
    #[serde(default = "enabled")]
    pub enable_refresh_token: bool,
    /// Behaviour when refresh fails.
    #[serde(default)]
    pub login_expired_mode: LoginExpiredMode,
    /// Value of the `Accept-Language` header.
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Path of the refresh endpoint.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enable_refresh_token: true,
            login_expired_mode: LoginExpiredMode::default(),
            locale: default_locale(),
            refresh_path: default_refresh_path(),
        }
    }
}

fn default_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_success_code() -> i64 {
    200
}

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// TTL of manual [`set_cache`](crate::CachingClient::set_cache) entries.
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub default_ttl: Duration,
    /// Envelope code of a successful response.
    #[serde(default = "default_success_code")]
    pub success_code: i64,
    /// Default policies by endpoint.
    #[serde(default = "policy::default_rules")]
    pub policies: Vec<PolicyRule>,
    /// Invalidation rules, in match order.
    #[serde(default = "invalidation::default_rules")]
    pub invalidation: Vec<InvalidationRule>,
    /// Session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
            success_code: default_success_code(),
            policies: policy::default_rules(),
            invalidation: invalidation::default_rules(),
            session: SessionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig =
            serde_saphyr::from_str(yaml).map_err(|error| ConfigError::Parse(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rule) = self.policies.iter().find(|rule| rule.path.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "policy for {} has an empty path",
                rule.method
            )));
        }
        if self.invalidation.iter().any(|rule| rule.trigger.is_empty()) {
            return Err(ConfigError::Invalid(
                "invalidation rule has an empty trigger".to_owned(),
            ));
        }
        if self.session.refresh_path.is_empty() {
            return Err(ConfigError::Invalid("refresh_path is empty".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_the_default() {
        let config = ClientConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.policies.len(), 6);
        assert_eq!(config.invalidation.len(), 4);
        assert_eq!(config.session.locale, "zh-CN");
        assert_eq!(config.session.login_expired_mode, LoginExpiredMode::Modal);
    }

    #[test]
    fn parses_policies_and_session() {
        let yaml = r#"
default_ttl: 1m
success_code: 0
policies:
  - path: /files
    ttl: 3m
  - method: POST
    path: /search
    ttl: 10s
    enabled: false
invalidation:
  - trigger: /files
    purge: [/files, /quota]
session:
  enable_refresh_token: false
  login_expired_mode: Logout
"#;
        let config = ClientConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.default_ttl, Duration::from_secs(60));
        assert_eq!(config.success_code, 0);
        assert_eq!(
            config.policies,
            vec![
                PolicyRule::get("/files", Duration::from_secs(180)),
                PolicyRule {
                    method: Method::POST,
                    path: "/search".into(),
                    ttl: Some(Duration::from_secs(10)),
                    enabled: false,
                },
            ]
        );
        assert_eq!(
            config.invalidation,
            vec![InvalidationRule::new("/files", ["/files", "/quota"])]
        );
        assert!(!config.session.enable_refresh_token);
        assert_eq!(config.session.login_expired_mode, LoginExpiredMode::Logout);
        assert_eq!(config.session.refresh_path, "/api/v1/auth/refresh");
    }

    #[test]
    fn empty_policy_path_is_invalid() {
        let yaml = "policies:\n  - path: \"\"\n    ttl: 1m\n";
        assert!(matches!(
            ClientConfig::from_yaml(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn bad_duration_is_a_parse_error() {
        let yaml = "default_ttl: soon\n";
        assert!(matches!(
            ClientConfig::from_yaml(yaml),
            Err(ConfigError::Parse(_))
        ));
    }
}
