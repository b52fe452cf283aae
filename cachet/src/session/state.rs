use serde::{Deserialize, Serialize};

/// Tokens issued by a login or a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token attached to requests.
    pub access_token: String,
    /// Server session identifier sent with refresh requests.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl Credentials {
    /// Credentials without a session identifier.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            session_id: None,
        }
    }

    /// Sets the session identifier.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No token; requests go out without credentials.
    #[default]
    Anonymous,
    /// A token is attached to every request.
    Authenticated,
    /// A refresh call is in flight.
    Refreshing,
    /// Refresh failed and the expiry prompt was signalled.
    Expired,
}

impl SessionPhase {
    /// Returns the phase as a string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Anonymous => "anonymous",
            SessionPhase::Authenticated => "authenticated",
            SessionPhase::Refreshing => "refreshing",
            SessionPhase::Expired => "expired",
        }
    }
}

/// Credentials of the running client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    access_token: Option<String>,
    session_id: Option<String>,
    access_checked: bool,
    phase: SessionPhase,
}

impl SessionState {
    /// Current bearer token.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Current session identifier.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Whether the initial access check has completed.
    pub fn access_checked(&self) -> bool {
        self.access_checked
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn authenticate(&mut self, credentials: Credentials) {
        self.access_token = Some(credentials.access_token);
        self.session_id = credentials.session_id;
        self.phase = SessionPhase::Authenticated;
    }

    pub(crate) fn begin_refresh(&mut self) {
        self.phase = SessionPhase::Refreshing;
    }

    pub(crate) fn set_access_checked(&mut self) {
        self.access_checked = true;
    }

    /// Drops the tokens and moves to `phase`, returning the old token.
    pub(crate) fn clear(&mut self, phase: SessionPhase) -> Option<String> {
        self.session_id = None;
        self.phase = phase;
        self.access_token.take()
    }
}
