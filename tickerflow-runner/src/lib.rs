//! Tickerflow runner: configuration, report publication and the pipeline
//! orchestrator.
//!
//! This crate builds on `tickerflow-core` to provide:
//! - TOML pipeline configuration with validated defaults
//! - The run state machine with fixed-delay fetch retries
//! - Concurrent partitioning and analysis over one fetched table
//! - Report artifacts (CSV, JSON, Markdown) written atomically

pub mod config;
pub mod orchestrator;
pub mod publish;

pub use config::{ConfigError, PipelineConfig};
pub use orchestrator::{
    CancellationToken, PipelineOrchestrator, RunError, RunOutcome, RunState, RunSummary, Sleeper,
    ThreadSleeper,
};
pub use publish::{FileReportPublisher, PublishError, PublishedReport, ReportPublisher};
