//! # Homedash API
//!
//! HTTP application layer - routes and main entry point.
//!
//! This crate contains:
//! - axum route handlers (browser → backend bridge)
//! - Application context (dependency injection)
//! - Main entry point and setup
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Every response body is an `ApiResult` envelope

pub mod context;
pub mod routes;
pub mod utils;

pub use context::*;
pub use routes::{build_router, ApiError};
