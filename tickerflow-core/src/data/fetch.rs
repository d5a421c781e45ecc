//! DataFetcher: one normalized fetch against a DataProvider.
//!
//! A fetch either returns a complete (possibly sparse) PriceTable or fails.
//! It never retries; the orchestrator owns the retry policy.

use super::provider::{DataError, DataProvider, FetchResult};
use crate::domain::{DateRange, PriceBar, PriceTable, Ticker};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Why a fetch attempt produced no table.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport, HTTP or parse failure in the data source.
    #[error("download failed: {0}")]
    Download(#[from] DataError),

    /// The source answered, but with no bars for any requested ticker.
    #[error("data source returned no bars for any of {requested} ticker(s)")]
    EmptyResult { requested: usize },

    #[error("fetch requires at least one ticker")]
    NoTickers,
}

impl FetchError {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Download(_) | Self::EmptyResult { .. })
    }
}

/// Wraps a provider and enforces the fetch contract.
pub struct DataFetcher<'a> {
    provider: &'a dyn DataProvider,
}

impl<'a> DataFetcher<'a> {
    pub fn new(provider: &'a dyn DataProvider) -> Self {
        Self { provider }
    }

    /// Single fetch attempt for `tickers` over `range`.
    ///
    /// The returned table lists tickers in request order. Bars outside the
    /// range, void bars and tickers that were not requested are dropped.
    pub fn fetch(&self, tickers: &[Ticker], range: &DateRange) -> Result<PriceTable, FetchError> {
        if tickers.is_empty() {
            return Err(FetchError::NoTickers);
        }

        info!(
            provider = self.provider.name(),
            tickers = tickers.len(),
            %range,
            "fetching price data"
        );
        let results = self.provider.fetch(tickers, range)?;
        let table = normalize(tickers, range, results);

        if table.is_empty() {
            return Err(FetchError::EmptyResult {
                requested: tickers.len(),
            });
        }

        info!(
            bars = table.total_bars(),
            with_data = table.iter().filter(|(_, bars)| !bars.is_empty()).count(),
            "fetch complete"
        );
        Ok(table)
    }
}

fn normalize(tickers: &[Ticker], range: &DateRange, results: Vec<FetchResult>) -> PriceTable {
    let mut by_ticker: HashMap<Ticker, Vec<PriceBar>> = HashMap::new();
    for result in results {
        if !tickers.contains(&result.ticker) {
            debug!(ticker = %result.ticker, "dropping unrequested ticker from provider result");
            continue;
        }
        debug!(
            ticker = %result.ticker,
            source = ?result.source,
            bars = result.bars.len(),
            "provider result"
        );
        by_ticker.entry(result.ticker).or_default().extend(
            result
                .bars
                .into_iter()
                .filter(|b| !b.is_void() && range.contains(b.date)),
        );
    }

    PriceTable::from_series(tickers.iter().map(|t| {
        let bars = by_ticker.remove(t).unwrap_or_default();
        (t.clone(), bars)
    }))
}
