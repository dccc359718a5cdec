//! Session state machine

pub mod ports;
pub mod service;

pub use service::AuthService;
