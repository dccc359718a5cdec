//! Configuration structures
//!
//! Plain data only; loading from the environment or files lives in
//! `homedash-infra::config`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_DELAY_MS, DEFAULT_BIND_ADDR, DEFAULT_MAX_DELAY_MS,
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS, SECURE_SCHEME_PREFIX,
};

/// Connection parameters for the hosted backend.
///
/// Loaded once per process and never mutated afterwards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub application_id: String,
    pub rest_api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_key: Option<String>,
    pub server_url: String,
}

impl ConnectionConfig {
    pub fn new(
        application_id: impl Into<String>,
        rest_api_key: impl Into<String>,
        master_key: Option<String>,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            rest_api_key: rest_api_key.into(),
            master_key,
            server_url: server_url.into(),
        }
    }

    /// True when the id and key are present and the server URL uses the
    /// secure scheme.
    pub fn validate(&self) -> bool {
        !self.application_id.trim().is_empty()
            && !self.rest_api_key.trim().is_empty()
            && self.server_url.starts_with(SECURE_SCHEME_PREFIX)
    }

    /// Server URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}

// Keys never reach logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("application_id", &self.application_id)
            .field("rest_api_key", &"<redacted>")
            .field("master_key", &self.master_key.as_ref().map(|_| "<redacted>"))
            .field("server_url", &self.server_url)
            .finish()
    }
}

/// Exponential backoff policy for retryable request failures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    #[serde(with = "duration_ms")]
    pub base_delay: Duration,
    #[serde(with = "duration_ms")]
    pub max_delay: Duration,
    /// Multiplier applied per attempt, clamped to at least 1.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait after the failed attempt `attempt` (0-indexed):
    /// `min(base_delay * backoff_factor^attempt, max_delay)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = if self.backoff_factor.is_finite() { self.backoff_factor.max(1.0) } else { 1.0 };
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base_ms = self.base_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;

        let delay_ms = (base_ms * factor.powi(exponent)).min(max_ms);
        if delay_ms.is_finite() && delay_ms >= 0.0 {
            Duration::from_millis(delay_ms as u64)
        } else {
            self.max_delay
        }
    }
}

/// Outbound HTTP defaults applied by the resilient client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS), retry: RetryPolicy::default() }
    }
}

/// Settings for the inbound API server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// File used to persist the session token; in-memory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_file: Option<String>,
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: DEFAULT_BIND_ADDR.to_string(), session_file: None, json_logs: false }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub backend: ConnectionConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
