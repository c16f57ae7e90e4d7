//! Temporal validity of a price
//!
//! Ranges are half-open `[from, to)`; a missing bound is unbounded. The range
//! index works on microsecond thresholds, see `lower_bound` / `upper_bound`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open validity interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTimeRange {
    /// Inclusive start, `None` = since forever
    pub from: Option<DateTime<Utc>>,
    /// Exclusive end, `None` = until forever
    pub to: Option<DateTime<Utc>>,
}

impl DateTimeRange {
    /// Range between two instants
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Range starting at `from`, open-ended
    pub fn since(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Range ending at `to`, open at the start
    pub fn until(to: DateTime<Utc>) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Unbounded range
    pub fn infinite() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    /// Start threshold in microseconds since the epoch
    pub fn lower_bound(&self) -> i64 {
        self.from.map_or(i64::MIN, |from| from.timestamp_micros())
    }

    /// End threshold in microseconds since the epoch
    pub fn upper_bound(&self) -> i64 {
        self.to.map_or(i64::MAX, |to| to.timestamp_micros())
    }

    /// Check if the range holds no instant at all
    pub fn is_empty(&self) -> bool {
        self.lower_bound() >= self.upper_bound()
    }

    /// Check if `instant` falls into the range
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let point = instant.timestamp_micros();
        self.lower_bound() <= point && point < self.upper_bound()
    }
}

impl Default for DateTimeRange {
    fn default() -> Self {
        Self::infinite()
    }
}
