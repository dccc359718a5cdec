//! Application context - dependency injection container
//!
//! One backend adapter per process, shared by every service. Accessors hand
//! out clones of the same `Arc`, so all callers observe the same instance.

use std::sync::Arc;
use std::time::Duration;

use homedash_core::{AuthService, FoodService, RecordStore, SessionStore, SubscriptionService};
use homedash_domain::{Config, HomedashError, Result};
use homedash_infra::{BackendRestAdapter, FileSessionStore, MemorySessionStore};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Startup budget for the backend readiness probe.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    backend: Arc<BackendRestAdapter>,
    foods: Arc<FoodService>,
    subscriptions: Arc<SubscriptionService>,
    auth: Arc<AuthService>,
}

impl AppContext {
    /// Load configuration from the environment (or a config file) and build
    /// the context.
    pub fn from_env() -> Result<Self> {
        let config = homedash_infra::load()?;
        Self::new(config)
    }

    /// Build the context for `config`; session tokens go to
    /// `server.session_file` when set, otherwise they live in memory.
    pub fn new(config: Config) -> Result<Self> {
        let backend = BackendRestAdapter::from_config(&config).map_err(|err| {
            tracing::error!(error = %err, "failed to construct backend adapter");
            err
        })?;

        let sessions: Arc<dyn SessionStore> = match config.server.session_file.as_deref() {
            Some(path) => {
                tracing::info!(path, "Persisting session token to file");
                Arc::new(FileSessionStore::new(path))
            }
            None => Arc::new(MemorySessionStore::new()),
        };

        Ok(Self::from_parts(config, Arc::new(backend), sessions))
    }

    /// Assemble a context from already-built parts.
    pub fn from_parts(
        config: Config,
        backend: Arc<BackendRestAdapter>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let store: Arc<dyn RecordStore> = backend.clone();
        Self {
            config,
            foods: Arc::new(FoodService::new(Arc::clone(&store))),
            subscriptions: Arc::new(SubscriptionService::new(store)),
            auth: Arc::new(AuthService::new(backend.clone(), sessions)),
            backend,
        }
    }

    pub fn backend(&self) -> Arc<BackendRestAdapter> {
        Arc::clone(&self.backend)
    }

    pub fn foods(&self) -> Arc<FoodService> {
        Arc::clone(&self.foods)
    }

    pub fn subscriptions(&self) -> Arc<SubscriptionService> {
        Arc::clone(&self.subscriptions)
    }

    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    /// Warm up the backend connection and restore any persisted session.
    ///
    /// A backend that cannot be reached yet is logged and left for the first
    /// request to retry; only a probe that hangs past the startup budget is
    /// an error.
    pub async fn start(&self) -> Result<()> {
        match tokio::time::timeout(STARTUP_TIMEOUT, self.backend.initialize()).await {
            Ok(Ok(())) => tracing::info!("Backend client initialized"),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Backend not reachable at startup; will retry on demand");
            }
            Err(_) => {
                tracing::error!(timeout_secs = STARTUP_TIMEOUT.as_secs(), "Backend initialization timed out");
                return Err(HomedashError::Network(format!(
                    "Backend initialization timed out after {}s",
                    STARTUP_TIMEOUT.as_secs()
                )));
            }
        }

        self.auth.initialize().await;
        Ok(())
    }

    /// Check the backend client and its connectivity.
    ///
    /// An uninitialized client gets one initialization attempt first.
    pub async fn health_check(&self) -> HealthStatus {
        let mut status = HealthStatus::new();

        let init_error = match self.backend.initialize().await {
            Ok(()) => None,
            Err(err) => Some(err),
        };

        let client = match &init_error {
            None => ComponentHealth::healthy("backendClient"),
            Some(err) => ComponentHealth::unhealthy(
                "backendClient",
                format!("Backend client initialization failed: {err}"),
            ),
        };
        status = status.add_component(client);

        let connectivity = if init_error.is_some() {
            ComponentHealth::unhealthy(
                "connectivity",
                "Cannot test connectivity: backend client not initialized",
            )
        } else {
            let report = self.backend.health().await;
            if report.reachable {
                ComponentHealth::healthy("connectivity")
            } else {
                let reason = report.error.unwrap_or_else(|| "backend unreachable".to_string());
                ComponentHealth::unhealthy("connectivity", format!("Connectivity test failed: {reason}"))
            }
        };

        status.add_component(connectivity)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("backend", &self.backend)
            .field("authenticated", &self.auth.is_authenticated())
            .finish_non_exhaustive()
    }
}
