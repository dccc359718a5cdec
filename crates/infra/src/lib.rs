//! # Homedash Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Configuration loading (environment first, then TOML/JSON files)
//! - The resilient HTTP client
//! - The backend REST adapter (record store, credential exchange)
//! - Session token stores
//!
//! ## Architecture
//! - Implements traits defined in `homedash-core`
//! - Contains all "impure" code (network and filesystem I/O)

pub mod backend;
pub mod config;
pub mod errors;
pub mod http;
pub mod session;

// Re-export commonly used items
pub use backend::BackendRestAdapter;
pub use config::{global_config, load, load_from_env, load_from_file, validate_config};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, HttpMethod, RequestOptions};
pub use session::{FileSessionStore, MemorySessionStore};
