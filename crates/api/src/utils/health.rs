//! Health report for `GET /api/health`
//!
//! Components are recorded as named boolean checks; a failing component also
//! contributes its message to `errors`. The report is healthy only when every
//! check passes.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Overall health of the service
///
/// # Example
/// ```
/// use homedash_api::utils::health::{ComponentHealth, HealthStatus};
///
/// let status = HealthStatus::new()
///     .add_component(ComponentHealth::healthy("backendClient"))
///     .add_component(ComponentHealth::unhealthy("connectivity", "connection refused"));
///
/// assert!(!status.healthy);
/// assert_eq!(status.errors, vec!["connection refused".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// True when every check passed
    pub healthy: bool,

    /// Component name → whether it passed
    pub checks: BTreeMap<String, bool>,

    /// Messages from failing components, in the order they were added
    pub errors: Vec<String>,

    /// ISO-8601 time the report was produced
    pub timestamp: String,
}

impl HealthStatus {
    /// Empty report: healthy, no checks.
    pub fn new() -> Self {
        Self {
            healthy: true,
            checks: BTreeMap::new(),
            errors: Vec::new(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Record a component; returns self for chaining.
    #[must_use]
    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        let ComponentHealth { name, is_healthy, message } = component;
        self.healthy &= is_healthy;
        self.checks.insert(name, is_healthy);
        if let Some(message) = message.filter(|_| !is_healthy) {
            self.errors.push(message);
        }
        self
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Health of an individual component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component identifier (e.g. "backendClient", "connectivity")
    pub name: String,

    pub is_healthy: bool,

    /// Why the component is unhealthy
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }
}
