//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over the external price source (Yahoo
//! Finance, synthetic data) so the fetch contract can be exercised with
//! mocks in tests.

use crate::domain::{DateRange, PriceBar, Ticker};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for provider calls.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Bars returned by the provider for one requested ticker.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub ticker: Ticker,
    pub bars: Vec<PriceBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Synthetic,
}

/// External source of daily OHLCV bars.
///
/// One call covers the whole ticker set. Implementations make a single
/// attempt; retry policy lives with the caller.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for every ticker over `range` (`end` exclusive).
    ///
    /// A ticker the source does not know may come back with no bars; any
    /// transport or parse failure fails the whole call.
    fn fetch(&self, tickers: &[Ticker], range: &DateRange) -> Result<Vec<FetchResult>, DataError>;
}
