//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use homedash_domain::HomedashError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub HomedashError);

impl From<InfraError> for HomedashError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<HomedashError> for InfraError {
    fn from(value: HomedashError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoHomedashError {
    fn into_homedash(self) -> HomedashError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → HomedashError */
/* -------------------------------------------------------------------------- */

impl IntoHomedashError for HttpError {
    fn into_homedash(self) -> HomedashError {
        if self.is_timeout() {
            return HomedashError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return HomedashError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return HomedashError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => HomedashError::Auth(message),
                400..=499 => HomedashError::client(code, message),
                _ => HomedashError::Network(message),
            };
        }

        HomedashError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_homedash())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → HomedashError */
/* -------------------------------------------------------------------------- */

impl IntoHomedashError for JsonError {
    fn into_homedash(self) -> HomedashError {
        HomedashError::Serialization(format!("invalid JSON payload: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        Self(value.into_homedash())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → HomedashError */
/* -------------------------------------------------------------------------- */

impl IntoHomedashError for UrlError {
    fn into_homedash(self) -> HomedashError {
        HomedashError::Config(format!("invalid server URL: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        Self(value.into_homedash())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → HomedashError */
/* -------------------------------------------------------------------------- */

impl IntoHomedashError for IoError {
    fn into_homedash(self) -> HomedashError {
        match self.kind() {
            ErrorKind::NotFound => HomedashError::NotFound(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                HomedashError::Internal(format!("permission denied: {self}"))
            }
            ErrorKind::InvalidData => HomedashError::Serialization(self.to_string()),
            _ => HomedashError::Internal(format!("I/O failure: {self}")),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        Self(value.into_homedash())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
