//! Shared test helpers for `homedash-core` integration tests.
//!
//! In-memory implementations of the core ports so service tests can focus
//! on behaviour instead of transport.

#![allow(dead_code)]

pub mod auth;
pub mod store;

use std::sync::Arc;

use chrono::NaiveDate;
use homedash_core::clock::FixedClock;
use homedash_core::Clock;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn fixed_clock(y: i32, m: u32, d: u32) -> Arc<dyn Clock> {
    Arc::new(FixedClock(day(y, m, d)))
}
