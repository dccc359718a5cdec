//! Outbound HTTP with timeout and retry handling.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, HttpMethod, RequestOptions};
