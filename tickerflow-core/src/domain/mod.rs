//! Domain types for the daily ingest pipeline.

pub mod bar;
pub mod range;
pub mod report;
pub mod table;
pub mod ticker;

pub use bar::PriceBar;
pub use range::{DateRange, InvalidDateRange};
pub use report::{PartitionKey, PerformanceRecord, RankingReport};
pub use table::{PriceTable, TickerSeries};
pub use ticker::{InvalidTicker, Ticker};
