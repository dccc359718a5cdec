//! Record store port, query options and the typed repository on top of it.

pub mod ports;
pub mod query;
pub mod repository;
