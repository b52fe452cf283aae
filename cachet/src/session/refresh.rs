use async_trait::async_trait;
use http::Method;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::Credentials;
use crate::error::{ApiError, TransportError};
use crate::request::ApiRequest;
use crate::transport::Pipeline;

/// Why a refresh did not produce new credentials.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The server refused to refresh the session.
    #[error("refresh rejected: {0}")]
    Rejected(String),

    /// The refresh endpoint could not be reached.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The refresh endpoint answered with something other than credentials.
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),
}

/// Obtains a new access token for an expired session.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchanges the current session for new credentials.
    async fn refresh(&self, session_id: Option<&str>) -> Result<Credentials, RefreshError>;
}

#[derive(Deserialize)]
struct RefreshPayload {
    access_token: String,
    #[serde(default)]
    session_uuid: Option<String>,
}

/// Refreshes by POSTing the session identifier to an endpoint.
///
/// The pipeline must not contain the session guard itself, otherwise a
/// rejected refresh would try to refresh again.
#[derive(Debug, Clone)]
pub struct EndpointRefresher {
    pipeline: Pipeline,
    path: String,
    success_code: i64,
}

impl EndpointRefresher {
    /// Refresher POSTing to `path` through `pipeline`.
    pub fn new(pipeline: Pipeline, path: impl Into<String>) -> Self {
        Self {
            pipeline,
            path: path.into(),
            success_code: 200,
        }
    }

    /// Envelope code of a successful refresh, 200 by default.
    pub fn success_code(mut self, code: i64) -> Self {
        self.success_code = code;
        self
    }
}

#[async_trait]
impl TokenRefresher for EndpointRefresher {
    async fn refresh(&self, session_id: Option<&str>) -> Result<Credentials, RefreshError> {
        let request = ApiRequest::new(Method::POST, self.path.as_str())
            .with_data(json!({ "session_uuid": session_id }));

        let data = self
            .pipeline
            .send(request)
            .await
            .and_then(|response| response.into_data(self.success_code))
            .map_err(|error| match error {
                ApiError::Transport(error) => RefreshError::Transport(error),
                ApiError::InvalidResponse(message) => RefreshError::InvalidResponse(message),
                rejected => RefreshError::Rejected(rejected.to_string()),
            })?;

        let payload: RefreshPayload = serde_json::from_value(data)
            .map_err(|error| RefreshError::InvalidResponse(error.to_string()))?;
        Ok(Credentials {
            access_token: payload.access_token,
            session_id: payload.session_uuid,
        })
    }
}
