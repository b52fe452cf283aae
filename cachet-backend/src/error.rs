//! Error types for backend operations.

use thiserror::Error;

/// Error type for backend operations.
///
/// The caching client treats every variant as non-fatal: a failed read is a
/// miss, a failed write or purge is skipped.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal backend error, state or computation error.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),

    /// A payload could not be serialized into or out of the store.
    #[error("cache payload format error: {0}")]
    Format(#[from] serde_json::Error),
}

impl BackendError {
    /// Wraps any error as [`BackendError::Internal`].
    pub fn internal(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        BackendError::Internal(Box::new(error))
    }
}
