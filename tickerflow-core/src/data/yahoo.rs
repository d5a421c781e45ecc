//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API, one request per
//! symbol. Yahoo Finance has no official API and is subject to unannounced
//! format changes; every such change surfaces as a `ResponseFormatChanged`
//! error rather than a partially filled table.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{DateRange, PriceBar, Ticker};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://query2.finance.yahoo.com";

    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    /// Point the provider at another host (a mirror or a local stub).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the chart API URL for a symbol and a half-open date range.
    fn chart_url(&self, symbol: &str, range: &DateRange) -> String {
        let start_ts = midnight_utc(range.start());
        let end_ts = midnight_utc(range.end());
        format!(
            "{}/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true",
            self.base_url
        )
    }

    /// Parse the chart API response into bars.
    ///
    /// An empty timestamp list means no trading in the window and yields an
    /// empty vector.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<PriceBar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten());

            // Rows with no values at all are holidays.
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            let close = close.unwrap_or(f64::NAN);
            bars.push(PriceBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close,
                adj_close: adj_close.unwrap_or(close),
                volume: volume.unwrap_or(0),
            });
        }

        Ok(bars)
    }

    /// One request for one symbol. No retries.
    fn fetch_symbol(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceBar>, DataError> {
        let url = self.chart_url(symbol, range);
        debug!(%symbol, %url, "requesting chart");

        let resp = self.client.get(&url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                DataError::NetworkUnreachable(e.to_string())
            } else {
                DataError::Other(format!("request for {symbol} failed: {e}"))
            }
        })?;

        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok());
        if let Some(err) = status_error(resp.status(), retry_after, symbol) {
            return Err(err);
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        Self::parse_response(symbol, chart)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, tickers: &[Ticker], range: &DateRange) -> Result<Vec<FetchResult>, DataError> {
        let mut results = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let bars = not_found_as_empty(self.fetch_symbol(ticker.as_str(), range))?;
            results.push(FetchResult {
                ticker: ticker.clone(),
                bars,
                source: DataSource::YahooFinance,
            });
        }
        Ok(results)
    }
}

/// Error for a non-success chart response, `None` when the body should be parsed.
fn status_error(
    status: reqwest::StatusCode,
    retry_after: Option<&str>,
    symbol: &str,
) -> Option<DataError> {
    if status.is_success() {
        return None;
    }
    let err = match status.as_u16() {
        404 => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        429 => DataError::RateLimited {
            retry_after_secs: retry_after.and_then(|v| v.parse().ok()).unwrap_or(60),
        },
        401 => DataError::AuthenticationRequired("Yahoo Finance requires authentication".into()),
        code => DataError::Http {
            status: code,
            symbol: symbol.to_string(),
        },
    };
    Some(err)
}

/// A symbol the source does not know contributes an empty series; every
/// other error fails the whole fetch.
fn not_found_as_empty(
    result: Result<Vec<PriceBar>, DataError>,
) -> Result<Vec<PriceBar>, DataError> {
    match result {
        Err(DataError::SymbolNotFound { symbol }) => {
            warn!(%symbol, "symbol not found, treating as no data");
            Ok(Vec::new())
        }
        other => other,
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp())
}
