//! Date ranges for fetch queries and partition windows.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Query window `[start, end)`.
///
/// `start` is inclusive and `end` exclusive when sent to a provider. The
/// partition window is independent of `end`: it always covers a fixed number
/// of calendar days starting at `start` (see [`DateRange::window`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("date range start {start} is after end {end}")]
pub struct InvalidDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidDateRange> {
        if start > end {
            return Err(InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` calendar days before `reference`, excluding `reference` itself.
    ///
    /// A run triggered on 2024-03-08 with a 7-day lookback queries
    /// `[2024-03-01, 2024-03-08)`.
    pub fn trailing(reference: NaiveDate, days: u32) -> Self {
        let start = reference
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end: reference,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls inside the half-open query window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Enumerate `len` consecutive calendar days starting at `start`.
    ///
    /// The window length is fixed by the caller, never derived from `end`.
    pub fn window(&self, len: u32) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..u64::from(len)).map_while(move |offset| start.checked_add_days(Days::new(offset)))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
