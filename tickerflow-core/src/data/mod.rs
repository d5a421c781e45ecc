//! Data access: universe resolution, provider adapters, fetch and partitioning.

pub mod fetch;
pub mod partition;
pub mod provider;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use fetch::{DataFetcher, FetchError};
pub use partition::{
    PartitionWriteError, PartitionWriteReport, Partitioner, WrittenPartition, PARTITION_WINDOW_DAYS,
};
pub use provider::{DataError, DataProvider, DataSource, FetchResult};
pub use synthetic::SyntheticProvider;
pub use universe::{
    ConfigurationError, InlineSource, JsonFileSource, Selection, TickerRegistry, UniverseSource,
};
pub use yahoo::YahooProvider;
