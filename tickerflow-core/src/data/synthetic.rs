//! Synthetic data provider for offline and development runs.
//!
//! Produces a seeded random walk from 100.0 on weekdays. The same ticker and
//! seed always yield the same bars, so offline runs are reproducible.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{DateRange, PriceBar, Ticker};
use chrono::{Datelike, Days, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn generate(&self, ticker: &Ticker, range: &DateRange) -> Vec<PriceBar> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(ticker.as_str().as_bytes());
        let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

        let mut bars = Vec::new();
        let mut price = 100.0_f64;
        let mut current = range.start();

        while range.contains(current) {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                let daily_return: f64 = rng.gen_range(-0.03..0.03);
                let open = price;
                let close = price * (1.0 + daily_return);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
                let volume = rng.gen_range(500_000..5_000_000u64);

                bars.push(PriceBar {
                    date: current,
                    open,
                    high,
                    low,
                    close,
                    adj_close: close,
                    volume,
                });
                price = close;
            }

            match current.checked_add_days(Days::new(1)) {
                Some(next) => current = next,
                None => break,
            }
        }

        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, tickers: &[Ticker], range: &DateRange) -> Result<Vec<FetchResult>, DataError> {
        Ok(tickers
            .iter()
            .map(|ticker| FetchResult {
                ticker: ticker.clone(),
                bars: self.generate(ticker, range),
                source: DataSource::Synthetic,
            })
            .collect())
    }
}
