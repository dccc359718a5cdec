//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Homedash
///
/// Every variant renders a non-empty, human-readable message; the API layer
/// forwards `to_string()` verbatim to clients.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum HomedashError {
    /// Missing or malformed connection configuration. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure, timeout, or 5xx after retries were exhausted.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend rejected the request with a 4xx status.
    #[error("{message}")]
    Client { status: u16, message: String },

    /// A backend operation was attempted before a successful `initialize()`.
    #[error("Backend client not initialized. Call initialize() first.")]
    NotInitialized,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HomedashError {
    /// Build a client error, falling back to a generic message when the
    /// backend did not supply one.
    pub fn client(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            format!("Request failed with status {status}")
        } else {
            message
        };
        Self::Client { status, message }
    }

    /// HTTP status carried by a client error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error indicates the caller's session is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Client { status, .. } => *status == 401 || *status == 403,
            Self::Auth(message) => message.to_ascii_lowercase().contains("unauthorized"),
            _ => false,
        }
    }

    /// Whether the backend reported the session token as invalid.
    pub fn is_invalid_session(&self) -> bool {
        let message = match self {
            Self::Client { message, .. } | Self::Auth(message) => message,
            _ => return false,
        };
        message.to_ascii_lowercase().contains("invalid session token")
    }
}

impl From<serde_json::Error> for HomedashError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Homedash operations
pub type Result<T> = std::result::Result<T, HomedashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_never_has_empty_message() {
        let err = HomedashError::client(404, "   ");
        assert_eq!(err.to_string(), "Request failed with status 404");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn every_variant_renders_a_message() {
        let errors = [
            HomedashError::Config("missing BACKEND_SERVER_URL".into()),
            HomedashError::Network("HTTP 503: Service Unavailable".into()),
            HomedashError::client(400, "bad where"),
            HomedashError::NotInitialized,
            HomedashError::Auth("Invalid username/password.".into()),
            HomedashError::NotFound("food abc".into()),
            HomedashError::InvalidInput("name is required".into()),
            HomedashError::Serialization("expected value".into()),
            HomedashError::Internal("boom".into()),
        ];

        for err in errors {
            assert!(!err.to_string().trim().is_empty(), "{err:?} rendered empty");
        }
    }

    #[test]
    fn session_classification() {
        assert!(HomedashError::client(401, "unauthorized").is_unauthorized());
        assert!(HomedashError::Auth("unauthorized request".into()).is_unauthorized());
        assert!(!HomedashError::client(404, "Object not found.").is_unauthorized());

        let invalid = HomedashError::client(400, "Invalid session token");
        assert!(invalid.is_invalid_session());
        assert!(!HomedashError::Network("invalid session token".into()).is_invalid_session());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(HomedashError::Config("x".into())).unwrap();
        assert_eq!(json["type"], "Config");
        assert_eq!(json["message"], "x");
    }
}
