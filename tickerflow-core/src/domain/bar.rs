//! PriceBar: one trading day of OHLCV data for one ticker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar as returned by the data source.
///
/// Bars exist only for trading days. A missing weekend or holiday bar is
/// normal and is represented by absence, never by a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// True when every price field is NaN (provider row with no data).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() && self.high.is_nan() && self.low.is_nan() && self.close.is_nan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            adj_close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn partial_nan_is_not_void() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(!bar.is_void());
    }

    #[test]
    fn all_nan_prices_is_void() {
        let bar = PriceBar {
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close: f64::NAN,
            ..sample_bar()
        };
        assert!(bar.is_void());
    }
}
