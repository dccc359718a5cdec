//! Session-related types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated backend user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub session_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("session_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Snapshot of the session state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<UserRecord>,
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
}

impl AuthState {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: UserRecord) -> Self {
        Self { is_authenticated: true, session_token: Some(user.session_token.clone()), user: Some(user) }
    }
}

/// What the backend accepts to establish a session.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    Password { username: String, password: String },
    #[serde(rename_all = "camelCase")]
    SessionToken { session_token: String },
}

impl Credentials {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password { username: username.into(), password: password.into() }
    }

    pub fn session_token(token: impl Into<String>) -> Self {
        Self::SessionToken { session_token: token.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { username, .. } => {
                f.debug_struct("Password").field("username", username).finish_non_exhaustive()
            }
            Self::SessionToken { .. } => f.write_str("SessionToken(<redacted>)"),
        }
    }
}
