//! Helpers shared by the route handlers.

pub mod health;
pub mod logging;
