//! Error types surfaced by the client.

use http::StatusCode;
use thiserror::Error;

/// Boxed error source carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to complete a network exchange.
///
/// None of these mean the server rejected the request; the caller may retry.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The per-call timeout elapsed before a response arrived.
    #[error("request timed out")]
    Timeout,

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connection(#[source] BoxError),

    /// The exchange was cancelled before it completed.
    #[error("request aborted")]
    Aborted,

    /// Any other transport fault.
    #[error(transparent)]
    Other(BoxError),
}

impl TransportError {
    /// Wraps any error as [`TransportError::Other`].
    pub fn other(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        TransportError::Other(Box::new(error))
    }
}

/// Error returned by every client call.
///
/// Cache faults never appear here; they are logged and absorbed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The network exchange failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session could not be recovered and a new login is required.
    #[error("not authenticated")]
    Unauthenticated,

    /// The server answered with an error status or a failing envelope code.
    #[error("{message}")]
    Application {
        /// HTTP status of the response.
        status: StatusCode,
        /// Envelope code, when the body carried one.
        code: Option<i64>,
        /// Human-readable message extracted from the body.
        message: String,
    },

    /// The body is not a valid envelope or its payload does not fit the
    /// requested type.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Returns `true` for [`ApiError::Transport`].
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Returns `true` for [`ApiError::Unauthenticated`].
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
    }

    /// HTTP status of an application error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Application { status, .. } => Some(*status),
            ApiError::Unauthenticated => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_error_displays_its_message() {
        let error = ApiError::Application {
            status: StatusCode::BAD_REQUEST,
            code: Some(4001),
            message: "folder already exists".into(),
        };
        assert_eq!(error.to_string(), "folder already exists");
        assert_eq!(error.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn transport_error_converts() {
        let error: ApiError = TransportError::Timeout.into();
        assert!(error.is_transport());
        assert_eq!(error.to_string(), "request timed out");
    }
}
