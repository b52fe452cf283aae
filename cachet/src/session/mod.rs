//! Access-token lifecycle.
//!
//! [`SessionGuard`] is an [`Interceptor`](crate::Interceptor) that attaches
//! the bearer token to every request, and on a 401 refreshes the token once
//! for all concurrently failing requests before replaying them.
//!
//! ```text
//! Anonymous --login--> Authenticated --401--> Refreshing
//!                            ^                    |
//!                            +------ success -----+
//!                                                 |
//!             Anonymous <-- failure (logout) -----+
//!             Expired   <-- failure (modal) ------+
//! ```

mod guard;
mod refresh;
mod state;

use async_trait::async_trait;

pub use guard::{SessionGuard, SessionGuardBuilder};
pub use refresh::{EndpointRefresher, RefreshError, TokenRefresher};
pub use state::{Credentials, SessionPhase, SessionState};

pub use crate::config::{LoginExpiredMode, SessionConfig};

/// Application callbacks for forced re-authentication.
///
/// Called at most once per lost session.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    /// The session expired after the access check; show the login prompt.
    async fn session_expired(&self) {}

    /// The session is gone; send the user back to login.
    async fn logout(&self, previous_token: Option<String>) {
        let _ = previous_token;
    }
}

/// Handler that ignores every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionHandler;

impl SessionHandler for NoopSessionHandler {}
