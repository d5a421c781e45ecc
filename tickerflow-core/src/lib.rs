//! tickerflow core: the daily price ingest pipeline's building blocks.
//!
//! - Domain types (tickers, date ranges, bars, the fetched price table)
//! - Ticker universe resolution
//! - Data provider trait with Yahoo Finance and synthetic adapters
//! - Single-attempt fetch with a strict all-or-nothing contract
//! - Day/ticker partitioned CSV writer
//! - Close-to-close performance ranking

pub mod analysis;
pub mod data;
pub mod domain;

pub use analysis::{AnalysisError, PerformanceAnalyzer};
pub use data::{
    ConfigurationError, DataFetcher, DataProvider, FetchError, PartitionWriteReport, Partitioner,
    Selection, TickerRegistry,
};
pub use domain::{DateRange, PriceBar, PriceTable, RankingReport, Ticker};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the shared table and both consumers can cross threads.
    ///
    /// Partitioning and ranking run concurrently on the same table.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceTable>();
        require_sync::<PriceTable>();
        require_send::<RankingReport>();
        require_sync::<RankingReport>();
        require_send::<Partitioner>();
        require_sync::<Partitioner>();
        require_send::<PerformanceAnalyzer>();
        require_sync::<PerformanceAnalyzer>();
        require_send::<PartitionWriteReport>();
        require_send::<AnalysisError>();
        require_send::<FetchError>();
    }
}
