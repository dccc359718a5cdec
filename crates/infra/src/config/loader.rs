//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If any `BACKEND_*` variable is set, the environment is authoritative
//!    and an incomplete or malformed environment is an error
//! 2. Otherwise falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned, so an
//! invalid configuration never reaches the HTTP layer.
//!
//! ## Environment Variables
//! - `BACKEND_APPLICATION_ID`: Application id (required)
//! - `BACKEND_REST_API_KEY`: REST API key (required)
//! - `BACKEND_MASTER_KEY`: Master key, sent instead of the REST key when set
//! - `BACKEND_SERVER_URL`: Server URL, must use `https://` (required)
//! - `HOMEDASH_BIND_ADDR`: API listen address (default `0.0.0.0:8000`)
//! - `HOMEDASH_HTTP_TIMEOUT_MS`: Per-attempt request timeout
//! - `HOMEDASH_MAX_RETRIES`: Retries after the first attempt
//! - `HOMEDASH_SESSION_FILE`: Session token file; in-memory when unset
//! - `HOMEDASH_LOG_FORMAT`: `json` for JSON log lines
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `$HOMEDASH_CONFIG`
//! 2. `./homedash.toml` or `./homedash.json` (current working directory)
//! 3. `./config.toml` or `./config.json` (current working directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::time::Duration;

use homedash_domain::constants::SECURE_SCHEME_PREFIX;
use homedash_domain::{Config, ConnectionConfig, HomedashError, HttpConfig, Result, ServerConfig};
use once_cell::sync::OnceCell;
use url::Url;

use crate::errors::InfraError;

const REQUIRED_ENV: [&str; 3] = ["BACKEND_APPLICATION_ID", "BACKEND_REST_API_KEY", "BACKEND_SERVER_URL"];

static GLOBAL: OnceCell<Config> = OnceCell::new();

/// Process-wide configuration, loaded on first use.
///
/// A failed load is not cached; the next call tries again.
///
/// # Errors
/// Same as [`load`].
pub fn global_config() -> Result<&'static Config> {
    GLOBAL.get_or_try_init(load)
}

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `HomedashError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or fail validation
pub fn load() -> Result<Config> {
    if REQUIRED_ENV.iter().any(|key| std::env::var_os(key).is_some()) {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    tracing::debug!("No backend environment variables set, trying config file");
    load_from_file(None).map_err(|err| match err {
        HomedashError::Config(message) if message.starts_with("No config file found") => {
            HomedashError::Config(format!(
                "{message}; set {} or provide homedash.toml",
                REQUIRED_ENV.join(", ")
            ))
        }
        other => other,
    })
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `HomedashError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let backend = ConnectionConfig::new(
        env_var("BACKEND_APPLICATION_ID")?,
        env_var("BACKEND_REST_API_KEY")?,
        std::env::var("BACKEND_MASTER_KEY").ok().filter(|key| !key.trim().is_empty()),
        env_var("BACKEND_SERVER_URL")?,
    );

    let mut http = HttpConfig::default();
    if let Some(timeout) = env_parse::<u64>("HOMEDASH_HTTP_TIMEOUT_MS")? {
        http.timeout = Duration::from_millis(timeout);
    }
    if let Some(retries) = env_parse::<u32>("HOMEDASH_MAX_RETRIES")? {
        http.retry = http.retry.with_max_retries(retries);
    }

    let mut server = ServerConfig::default();
    if let Some(bind_addr) = env_optional("HOMEDASH_BIND_ADDR") {
        server.bind_addr = bind_addr;
    }
    server.session_file = env_optional("HOMEDASH_SESSION_FILE");
    server.json_logs = env_optional("HOMEDASH_LOG_FORMAT")
        .is_some_and(|format| format.eq_ignore_ascii_case("json"));

    let config = Config { backend, http, server };
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `HomedashError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or the contents fail validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(HomedashError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            HomedashError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| HomedashError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Check the connection parameters before any request is issued.
///
/// # Errors
/// Returns `HomedashError::Config` naming the first invalid field.
pub fn validate_config(config: &Config) -> Result<()> {
    let backend = &config.backend;

    if backend.application_id.trim().is_empty() {
        return Err(HomedashError::Config("Application id must not be empty".into()));
    }
    if backend.rest_api_key.trim().is_empty() {
        return Err(HomedashError::Config("REST API key must not be empty".into()));
    }
    if !backend.server_url.starts_with(SECURE_SCHEME_PREFIX) {
        return Err(HomedashError::Config(format!(
            "Server URL must start with {SECURE_SCHEME_PREFIX}: {}",
            backend.server_url
        )));
    }

    let url = Url::parse(&backend.server_url).map_err(InfraError::from)?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(HomedashError::Config(format!(
            "Server URL has no host: {}",
            backend.server_url
        )));
    }

    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| HomedashError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| HomedashError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(HomedashError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(explicit) = env_optional("HOMEDASH_CONFIG") {
        candidates.push(PathBuf::from(explicit));
    }

    let names = ["homedash.toml", "homedash.json", "config.toml", "config.json"];

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(names.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(names.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `HomedashError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    env_optional(key).ok_or_else(|| {
        HomedashError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-blank environment variable, trimmed.
fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_optional(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| HomedashError::Config(format!("Invalid {key}: {e}")))
        })
        .transpose()
}
