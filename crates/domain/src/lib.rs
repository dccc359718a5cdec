//! # Homedash Domain
//!
//! Pure data for the dashboard: error taxonomy, configuration structures,
//! record types for the `subscription` and `food` collections, the backend's
//! tagged date encoding and the `ApiResult` envelope.
//!
//! ## Architecture
//! - No dependencies on other Homedash crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
