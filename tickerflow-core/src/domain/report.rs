//! Output records: partition keys and ranking reports.

use super::ticker::Ticker;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifies exactly one partition file: `<YYYY-MM-DD>/<TICKER>.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub date: NaiveDate,
    pub ticker: Ticker,
}

impl PartitionKey {
    pub fn new(date: NaiveDate, ticker: Ticker) -> Self {
        Self { date, ticker }
    }

    /// Day directory name, `YYYY-MM-DD`.
    pub fn day_dir(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Path relative to the data root.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.day_dir()).join(format!("{}.csv", self.ticker))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.day_dir(), self.ticker)
    }
}

/// Close-to-close percentage change for one ticker over the fetched window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub ticker: Ticker,
    pub pct_change: f64,
}

/// Best and worst movers as of the latest bar in the table.
///
/// `top` and `bottom` are slices of the same descending sequence, so they
/// overlap whenever fewer than `2 * N` tickers qualify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    pub as_of_date: NaiveDate,
    pub top: Vec<PerformanceRecord>,
    pub bottom: Vec<PerformanceRecord>,
}
