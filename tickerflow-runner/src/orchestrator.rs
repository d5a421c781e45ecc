//! Pipeline orchestrator: one scheduled run, start to finish.
//!
//! ```text
//! Scheduled → Resolving → Fetching → {Partitioning ∥ Analyzing} → Completed
//!                 ╰───────────┴──────────────────┴───────────────→ Failed
//! ```
//!
//! Failure policy:
//! - Resolving: configuration errors are fatal and never retried.
//! - Fetching: download and empty-result errors are retried up to
//!   `fetch.max_attempts` times with a fixed delay. Exhaustion ends the run
//!   gracefully (`RunOutcome::DownloadAborted`), not as an error.
//! - Partitioning: per-file failures are collected in the write report; the
//!   run still completes.
//! - Analyzing: failure is fatal and returned to the caller.
//!
//! Partitioning and analysis read the same immutable table and run in
//! parallel. The report is published only after both finished and only if
//! the run was not cancelled in the meantime.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tickerflow_core::analysis::{AnalysisError, PerformanceAnalyzer};
use tickerflow_core::data::{
    ConfigurationError, DataFetcher, DataProvider, FetchError, PartitionWriteReport, Partitioner,
    Selection, TickerRegistry, UniverseSource,
};
use tickerflow_core::domain::{DateRange, PriceTable, RankingReport, Ticker};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::publish::{PublishError, PublishedReport, ReportPublisher};

/// Fatal run failures. Each one means the run produced no report.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("ticker universe: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("fetch precondition failed: {0}")]
    Fetch(FetchError),

    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("report publication failed: {0}")]
    Publish(#[from] PublishError),
}

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Scheduled,
    Resolving,
    Fetching,
    Partitioning,
    Analyzing,
    Completed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scheduled => "scheduled",
            Self::Resolving => "resolving",
            Self::Fetching => "fetching",
            Self::Partitioning => "partitioning",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a run that did not fail fatally ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Files written (possibly degraded) and report published.
    Completed {
        partitions: PartitionWriteReport,
        ranking: RankingReport,
        published: PublishedReport,
    },
    /// Every fetch attempt failed. No files, no report.
    DownloadAborted { attempts: u32, last_error: String },
    /// Stopped by the scheduler before `before` was entered.
    Cancelled { before: RunState },
}

/// Result of one run, including the states it went through.
#[derive(Debug)]
pub struct RunSummary {
    pub reference_date: NaiveDate,
    pub range: DateRange,
    pub tickers: Vec<Ticker>,
    pub fetch_attempts: u32,
    pub transitions: Vec<RunState>,
    pub outcome: RunOutcome,
}

impl RunSummary {
    pub fn final_state(&self) -> RunState {
        self.transitions.last().copied().unwrap_or(RunState::Scheduled)
    }
}

/// Waits between fetch attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Shared flag the scheduler flips to stop a run between steps.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wires the registry, fetcher, partitioner, analyzer and publisher together.
pub struct PipelineOrchestrator<'a> {
    config: PipelineConfig,
    universe: &'a dyn UniverseSource,
    provider: &'a dyn DataProvider,
    publisher: &'a dyn ReportPublisher,
    sleeper: &'a dyn Sleeper,
    cancel: CancellationToken,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(
        config: PipelineConfig,
        universe: &'a dyn UniverseSource,
        provider: &'a dyn DataProvider,
        publisher: &'a dyn ReportPublisher,
    ) -> Self {
        Self {
            config,
            universe,
            provider,
            publisher,
            sleeper: &ThreadSleeper,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute one run for `reference_date` (the trigger's "today").
    ///
    /// `selection` overrides the configured universe limit.
    pub fn run(
        &self,
        reference_date: NaiveDate,
        selection: Option<Selection>,
    ) -> Result<RunSummary, RunError> {
        let range = DateRange::trailing(reference_date, self.config.window.days);
        let mut summary = RunSummary {
            reference_date,
            range,
            tickers: Vec::new(),
            fetch_attempts: 0,
            transitions: vec![RunState::Scheduled],
            outcome: RunOutcome::Cancelled {
                before: RunState::Resolving,
            },
        };
        info!(%reference_date, %range, "pipeline run scheduled");

        // ── Resolving ──
        if self.cancelled(&summary, RunState::Resolving) {
            return Ok(summary);
        }
        self.transition(&mut summary, RunState::Resolving);
        let selection = selection.unwrap_or_else(|| self.config.universe.selection());
        summary.tickers = match TickerRegistry::resolve(self.universe, selection) {
            Ok(tickers) => tickers,
            Err(e) => {
                error!(source = %self.universe.describe(), error = %e, "universe resolution failed");
                self.transition(&mut summary, RunState::Failed);
                return Err(e.into());
            }
        };
        info!(tickers = summary.tickers.len(), ?selection, "universe resolved");

        // ── Fetching ──
        if self.cancelled(&summary, RunState::Fetching) {
            summary.outcome = RunOutcome::Cancelled {
                before: RunState::Fetching,
            };
            return Ok(summary);
        }
        self.transition(&mut summary, RunState::Fetching);
        let table = match self.fetch_with_retry(&mut summary)? {
            Some(table) => table,
            None => return Ok(summary),
        };

        // ── Partitioning ∥ Analyzing ──
        if self.cancelled(&summary, RunState::Partitioning) {
            summary.outcome = RunOutcome::Cancelled {
                before: RunState::Partitioning,
            };
            return Ok(summary);
        }
        self.transition(&mut summary, RunState::Partitioning);
        self.transition(&mut summary, RunState::Analyzing);

        let partitioner = Partitioner::new(&self.config.storage.data_dir);
        let analyzer = PerformanceAnalyzer::new(self.config.report.top_n);
        let (partitions, ranking) = rayon::join(
            || partitioner.partition(&table, &range),
            || analyzer.analyze(&table),
        );

        if partitions.is_degraded() {
            warn!(
                failed = partitions.failed.len(),
                written = partitions.written.len(),
                "partitioning degraded"
            );
        }

        let ranking = match ranking {
            Ok(ranking) => ranking,
            Err(e) => {
                error!(
                    error = %e,
                    partitions_written = partitions.written.len(),
                    "analysis failed, no report will be published"
                );
                self.transition(&mut summary, RunState::Failed);
                return Err(e.into());
            }
        };

        // ── Completed ──
        if self.cancelled(&summary, RunState::Completed) {
            summary.outcome = RunOutcome::Cancelled {
                before: RunState::Completed,
            };
            return Ok(summary);
        }
        let published = match self.publisher.publish(&ranking) {
            Ok(published) => published,
            Err(e) => {
                error!(error = %e, "report publication failed");
                self.transition(&mut summary, RunState::Failed);
                return Err(e.into());
            }
        };

        self.transition(&mut summary, RunState::Completed);
        summary.outcome = RunOutcome::Completed {
            partitions,
            ranking,
            published,
        };
        Ok(summary)
    }

    /// Fetch with the fixed-delay retry policy.
    ///
    /// `Ok(None)` means every attempt failed and the run was ended
    /// gracefully; `summary.outcome` says why.
    fn fetch_with_retry(&self, summary: &mut RunSummary) -> Result<Option<PriceTable>, RunError> {
        let fetcher = DataFetcher::new(self.provider);
        let max_attempts = self.config.fetch.max_attempts.max(1);
        let delay = self.config.fetch.retry_delay();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                if self.cancel.is_cancelled() {
                    info!(attempt, "run cancelled between fetch attempts");
                    summary.outcome = RunOutcome::Cancelled {
                        before: RunState::Fetching,
                    };
                    return Ok(None);
                }
                self.sleeper.sleep(delay);
            }

            summary.fetch_attempts = attempt;
            match fetcher.fetch(&summary.tickers, &summary.range) {
                Ok(table) => return Ok(Some(table)),
                Err(e) if e.is_transient() => {
                    warn!(attempt, max_attempts, error = %e, "fetch attempt failed");
                    last_error = Some(e);
                }
                Err(e) => {
                    error!(error = %e, "fetch cannot succeed");
                    self.transition(summary, RunState::Failed);
                    return Err(RunError::Fetch(e));
                }
            }
        }

        let last_error = last_error.map(|e| e.to_string()).unwrap_or_default();
        error!(
            attempts = max_attempts,
            last_error = %last_error,
            "all fetch attempts failed, ending run without output"
        );
        self.transition(summary, RunState::Failed);
        summary.outcome = RunOutcome::DownloadAborted {
            attempts: max_attempts,
            last_error,
        };
        Ok(None)
    }

    fn cancelled(&self, summary: &RunSummary, next: RunState) -> bool {
        let cancelled = self.cancel.is_cancelled();
        if cancelled {
            info!(at = %summary.final_state(), before = %next, "run cancelled");
        }
        cancelled
    }

    fn transition(&self, summary: &mut RunSummary, next: RunState) {
        info!(from = %summary.final_state(), to = %next, "state transition");
        summary.transitions.push(next);
    }
}
