//! Source of "today" for expiry and payment windows.

use chrono::{NaiveDate, Utc};

pub trait Clock: Send + Sync {
    /// Current calendar date in UTC.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to a single date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
