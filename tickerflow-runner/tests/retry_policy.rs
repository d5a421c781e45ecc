//! Property tests for the fetch retry bound.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;
use proptest::prelude::*;
use tickerflow_core::data::{DataError, DataProvider, DataSource, FetchResult, InlineSource};
use tickerflow_core::domain::{DateRange, PriceBar, Ticker};
use tickerflow_runner::{
    FileReportPublisher, PipelineConfig, PipelineOrchestrator, RunOutcome, Sleeper,
};

/// Fails the first `failures` calls, then serves two bars for every ticker.
struct FlakyProvider {
    failures: usize,
    calls: AtomicUsize,
}

impl DataProvider for FlakyProvider {
    fn name(&self) -> &str {
        "flaky"
    }

    fn fetch(&self, tickers: &[Ticker], range: &DateRange) -> Result<Vec<FetchResult>, DataError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(DataError::NetworkUnreachable(format!("attempt {}", call + 1)));
        }
        Ok(tickers
            .iter()
            .map(|t| FetchResult {
                ticker: t.clone(),
                bars: range
                    .window(2)
                    .zip([10.0, 11.0])
                    .map(|(date, close)| PriceBar {
                        date,
                        open: close,
                        high: close,
                        low: close,
                        close,
                        adj_close: close,
                        volume: 1,
                    })
                    .collect(),
                source: DataSource::Synthetic,
            })
            .collect())
    }
}

#[derive(Default)]
struct CountingSleeper(Mutex<Vec<Duration>>);

impl Sleeper for CountingSleeper {
    fn sleep(&self, duration: Duration) {
        self.0.lock().unwrap().push(duration);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn attempts_never_exceed_the_configured_bound(
        max_attempts in 1u32..6,
        failures in 0usize..8,
        delay_secs in 1u64..120,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.storage.data_dir = dir.path().join("data");
        config.storage.report_dir = dir.path().join("reports");
        config.fetch.max_attempts = max_attempts;
        config.fetch.retry_delay_secs = delay_secs;

        let source = InlineSource(r#"{"tickers": ["AAA", "BBB"]}"#.into());
        let provider = FlakyProvider { failures, calls: AtomicUsize::new(0) };
        let publisher = FileReportPublisher::new(&config.storage.report_dir);
        let sleeper = CountingSleeper::default();

        let summary = PipelineOrchestrator::new(config, &source, &provider, &publisher)
            .with_sleeper(&sleeper)
            .run(NaiveDate::from_ymd_opt(2024, 5, 13).unwrap(), None)
            .unwrap();

        let calls = provider.calls.load(Ordering::SeqCst);
        prop_assert_eq!(calls, (failures + 1).min(max_attempts as usize));

        let sleeps = sleeper.0.lock().unwrap();
        prop_assert_eq!(sleeps.len(), calls - 1);
        prop_assert!(sleeps.iter().all(|d| *d == Duration::from_secs(delay_secs)));

        if failures < max_attempts as usize {
            let completed = matches!(summary.outcome, RunOutcome::Completed { .. });
            prop_assert!(completed);
        } else {
            let aborted = matches!(
                summary.outcome,
                RunOutcome::DownloadAborted { attempts, .. } if attempts == max_attempts
            );
            prop_assert!(aborted);
        }
    }
}
