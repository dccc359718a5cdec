//! Pantry tracking

pub mod service;

pub use service::{summarize_foods, FoodService};
