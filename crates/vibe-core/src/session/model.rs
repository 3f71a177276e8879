//! Session domain model.

use serde::{Deserialize, Serialize};

/// Authentication state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// Initial state until the first status probe resolves
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Principal descriptor returned by the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Wire shape of the session status probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The client's view of the session.
///
/// `identity` is present only when `state` is `Authenticated`; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionSnapshot {
    state: AuthState,
    identity: Option<Identity>,
}

impl SessionSnapshot {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            state: AuthState::Authenticated,
            identity: Some(identity),
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            state: AuthState::Unauthenticated,
            identity: None,
        }
    }

    /// Derives a snapshot from a status probe response.
    ///
    /// An authenticated response without a user falls back to `fallback_user`;
    /// with neither, the session is treated as unauthenticated.
    pub fn from_status(status: SessionStatus, fallback_user: Option<&str>) -> Self {
        if !status.authenticated {
            return Self::unauthenticated();
        }
        match status.user.or_else(|| fallback_user.map(Identity::new)) {
            Some(identity) => Self::authenticated(identity),
            None => Self::unauthenticated(),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn is_unknown(&self) -> bool {
        self.state == AuthState::Unknown
    }
}
