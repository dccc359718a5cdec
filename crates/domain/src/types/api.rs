//! The `{success, data?, error?}` envelope returned by every client call and
//! every inbound API route.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Failure half of [`ApiResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiFailure {
    /// HTTP status, 408 for timeouts, 500 for network failures.
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl ApiFailure {
    /// Build a failure; an empty message is replaced so callers can always
    /// render it.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            format!("Request failed with code {code}")
        } else {
            message
        };
        Self { code, message, details: Map::new() }
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code) && self.code != 408
    }
}

/// Result of a remote call: either data or a structured failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    Success(T),
    Failure(ApiFailure),
}

impl<T> ApiResult<T> {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            Self::Success(data) => ApiResult::Success(f(data)),
            Self::Failure(failure) => ApiResult::Failure(failure),
        }
    }

    pub fn into_result(self) -> Result<T, ApiFailure> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl<T> From<Result<T, ApiFailure>> for ApiResult<T> {
    fn from(result: Result<T, ApiFailure>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(failure) => Self::Failure(failure),
        }
    }
}

impl<T: Serialize> Serialize for ApiResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut envelope = serializer.serialize_struct("ApiResult", 2)?;
        match self {
            Self::Success(data) => {
                envelope.serialize_field("success", &true)?;
                envelope.serialize_field("data", data)?;
            }
            Self::Failure(failure) => {
                envelope.serialize_field("success", &false)?;
                envelope.serialize_field("error", failure)?;
            }
        }
        envelope.end()
    }
}
