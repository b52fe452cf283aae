use std::sync::Arc;

use async_trait::async_trait;
use http::header::{ACCEPT_LANGUAGE, AUTHORIZATION};
use http::{HeaderMap, HeaderValue};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{
    Credentials, LoginExpiredMode, NoopSessionHandler, SessionConfig, SessionHandler,
    SessionPhase, SessionState, TokenRefresher,
};
use crate::config::ConfigError;
use crate::error::ApiError;
use crate::metrics;
use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::transport::{Interceptor, Next};

/// Session interceptor with single-flight token refresh.
///
/// Clones share one session. Install one clone in the pipeline and keep
/// another to log in and out.
#[derive(Clone)]
pub struct SessionGuard {
    inner: Arc<Inner>,
}

struct Inner {
    state: RwLock<SessionState>,
    // Held for the duration of one refresh. tokio's mutex is FIFO, so
    // faulted requests are released in the order they queued.
    refresh_gate: Arc<Mutex<()>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    handler: Arc<dyn SessionHandler>,
    config: SessionConfig,
    locale: HeaderValue,
}

impl SessionGuard {
    /// Starts a guard for `config`.
    pub fn builder(config: SessionConfig) -> SessionGuardBuilder {
        SessionGuardBuilder {
            config,
            refresher: None,
            handler: Arc::new(NoopSessionHandler),
        }
    }

    /// Installs credentials from a login.
    pub async fn login(&self, credentials: Credentials) {
        self.inner.state.write().await.authenticate(credentials);
        debug!("session authenticated");
    }

    /// Drops the session, returning the token it held.
    pub async fn logout(&self) -> Option<String> {
        let previous = self
            .inner
            .state
            .write()
            .await
            .clear(SessionPhase::Anonymous);
        debug!(had_token = previous.is_some(), "session cleared");
        previous
    }

    /// Records that the initial access check has completed.
    pub async fn mark_access_checked(&self) {
        self.inner.state.write().await.set_access_checked();
    }

    /// Lifecycle phase.
    pub async fn phase(&self) -> SessionPhase {
        self.inner.state.read().await.phase()
    }

    /// Current bearer token.
    pub async fn access_token(&self) -> Option<String> {
        self.inner.state.read().await.access_token().map(str::to_owned)
    }

    /// Current session identifier.
    pub async fn session_id(&self) -> Option<String> {
        self.inner.state.read().await.session_id().map(str::to_owned)
    }

    /// Snapshot of the whole state.
    pub async fn state(&self) -> SessionState {
        self.inner.state.read().await.clone()
    }

    /// Writes the locale and current credentials into `request`, returning
    /// the token that was attached.
    async fn stamp(&self, request: &mut ApiRequest) -> Option<String> {
        request
            .headers
            .insert(ACCEPT_LANGUAGE, self.inner.locale.clone());

        let token = self.access_token().await;
        match token.as_deref() {
            Some(token) if set_bearer(&mut request.headers, token) => Some(token.to_owned()),
            Some(_) => {
                warn!("access token is not a valid header value, sending anonymously");
                request.headers.remove(AUTHORIZATION);
                None
            }
            None => {
                request.headers.remove(AUTHORIZATION);
                None
            }
        }
    }

    /// Returns a token newer than `rejected`, refreshing if nobody has yet.
    ///
    /// The refresh itself runs on its own task which owns the gate, so a
    /// caller dropped mid-refresh neither aborts it nor leaves the session
    /// stuck in [`SessionPhase::Refreshing`].
    async fn refreshed_token(&self, rejected: &str) -> Result<String, ApiError> {
        let gate = Arc::clone(&self.inner.refresh_gate).lock_owned().await;

        let (refresher, session_id) = {
            let mut state = self.inner.state.write().await;
            match state.access_token() {
                Some(current) if current != rejected => {
                    debug!("token already refreshed, replaying");
                    return Ok(current.to_owned());
                }
                None => {
                    debug!("session already cleared, not refreshing");
                    return Err(ApiError::Unauthenticated);
                }
                Some(_) => {}
            }
            let Some(refresher) = self.inner.refresher.clone() else {
                drop(state);
                warn!("no token refresher configured");
                self.expire(rejected).await;
                return Err(ApiError::Unauthenticated);
            };
            state.begin_refresh();
            (refresher, state.session_id().map(str::to_owned))
        };

        let guard = self.clone();
        let rejected_token = rejected.to_owned();
        let task = tokio::spawn(async move {
            let _gate = gate;
            guard
                .complete_refresh(refresher, session_id, &rejected_token)
                .await
        });

        match task.await {
            Ok(result) => result,
            Err(error) => {
                metrics::record_refresh("failure");
                warn!(%error, "token refresh task failed");
                self.expire(rejected).await;
                Err(ApiError::Unauthenticated)
            }
        }
    }

    async fn complete_refresh(
        &self,
        refresher: Arc<dyn TokenRefresher>,
        session_id: Option<String>,
        rejected: &str,
    ) -> Result<String, ApiError> {
        match refresher.refresh(session_id.as_deref()).await {
            Ok(credentials) => {
                let mut state = self.inner.state.write().await;
                if state.access_token() != Some(rejected) {
                    // The session changed while refreshing; it wins.
                    return state
                        .access_token()
                        .map(str::to_owned)
                        .ok_or(ApiError::Unauthenticated);
                }
                let token = credentials.access_token.clone();
                state.authenticate(credentials);
                metrics::record_refresh("success");
                info!("access token refreshed");
                Ok(token)
            }
            Err(error) => {
                metrics::record_refresh("failure");
                warn!(%error, "token refresh failed");
                self.expire(rejected).await;
                Err(ApiError::Unauthenticated)
            }
        }
    }

    /// Clears the session if it still holds `rejected` and signals the
    /// handler. Later calls for the same token are no-ops.
    async fn expire(&self, rejected: &str) {
        let (previous, prompt) = {
            let mut state = self.inner.state.write().await;
            if state.access_token() != Some(rejected) {
                return;
            }
            let prompt = self.inner.config.login_expired_mode == LoginExpiredMode::Modal
                && state.access_checked();
            let phase = if prompt {
                SessionPhase::Expired
            } else {
                SessionPhase::Anonymous
            };
            (state.clear(phase), prompt)
        };

        if prompt {
            warn!("session expired, prompting for login");
            self.inner.handler.session_expired().await;
        } else {
            warn!("session lost, logging out");
            self.inner.handler.logout(previous).await;
        }
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("config", &self.inner.config)
            .field("refresher", &self.inner.refresher.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Interceptor for SessionGuard {
    async fn handle(&self, mut request: ApiRequest, next: Next<'_>) -> Result<ApiResponse, ApiError> {
        let sent = self.stamp(&mut request).await;
        let mut replay = request.clone();

        let response = next.clone().run(request).await?;
        if !response.is_auth_failure() {
            return Ok(response);
        }

        let Some(rejected) = sent else {
            debug!(path = %replay.path, "anonymous request rejected");
            return Err(ApiError::Unauthenticated);
        };

        if !self.inner.config.enable_refresh_token {
            self.expire(&rejected).await;
            return Err(ApiError::Unauthenticated);
        }

        let token = self.refreshed_token(&rejected).await?;
        if !set_bearer(&mut replay.headers, &token) {
            warn!("refreshed token is not a valid header value");
            self.expire(&token).await;
            return Err(ApiError::Unauthenticated);
        }

        let response = next.run(replay).await?;
        if response.is_auth_failure() {
            warn!("replayed request rejected, re-authenticating");
            self.expire(&token).await;
            return Err(ApiError::Unauthenticated);
        }
        Ok(response)
    }
}

fn set_bearer(headers: &mut HeaderMap, token: &str) -> bool {
    match HeaderValue::try_from(format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            true
        }
        Err(_) => false,
    }
}

/// Builder for [`SessionGuard`].
pub struct SessionGuardBuilder {
    config: SessionConfig,
    refresher: Option<Arc<dyn TokenRefresher>>,
    handler: Arc<dyn SessionHandler>,
}

impl SessionGuardBuilder {
    /// Sets the token refresher. Without one every 401 re-authenticates.
    pub fn refresher(mut self, refresher: impl TokenRefresher + 'static) -> Self {
        self.refresher = Some(Arc::new(refresher));
        self
    }

    /// Sets the re-authentication callbacks.
    pub fn handler(mut self, handler: impl SessionHandler + 'static) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Sets shared re-authentication callbacks.
    pub fn handler_arc(mut self, handler: Arc<dyn SessionHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Builds the guard, anonymous until [`SessionGuard::login`].
    pub fn build(self) -> Result<SessionGuard, ConfigError> {
        let locale = HeaderValue::from_str(&self.config.locale)
            .map_err(|_| ConfigError::Invalid(format!("locale {:?}", self.config.locale)))?;
        Ok(SessionGuard {
            inner: Arc::new(Inner {
                state: RwLock::new(SessionState::default()),
                refresh_gate: Arc::new(Mutex::new(())),
                refresher: self.refresher,
                handler: self.handler,
                config: self.config,
                locale,
            }),
        })
    }
}
