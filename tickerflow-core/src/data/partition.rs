//! Partitioned CSV writer.
//!
//! Layout: `{data_dir}/{YYYY-MM-DD}/{TICKER}.csv`
//!
//! - The window is always 7 calendar days starting at the range start,
//!   independent of the range end.
//! - No file is written for a (day, ticker) pair without bars.
//! - Writes are atomic (write to .tmp, rename into place) and overwrite, so a
//!   re-run with the same table produces byte-identical files.
//! - A failed pair is recorded and the remaining pairs are still written.

use crate::domain::{DateRange, PartitionKey, PriceBar, PriceTable};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Length of the partition window, in calendar days.
pub const PARTITION_WINDOW_DAYS: u32 = 7;

/// Column header of every partition file.
pub const CSV_HEADER: [&str; 7] = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"];

/// Failure to persist one (day, ticker) partition.
#[derive(Debug, Error)]
#[error("failed to write partition {key}: {source}")]
pub struct PartitionWriteError {
    pub key: PartitionKey,
    #[source]
    pub source: io::Error,
}

/// A partition file that was written successfully.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenPartition {
    pub key: PartitionKey,
    pub path: PathBuf,
    pub rows: usize,
    /// BLAKE3 digest of the file contents.
    pub digest: String,
}

/// Outcome of one partitioning pass.
#[derive(Debug, Default)]
pub struct PartitionWriteReport {
    /// The calendar days considered, in order. Always the full window.
    pub days: Vec<NaiveDate>,
    pub written: Vec<WrittenPartition>,
    /// (day, ticker) pairs without bars; no file is written for these.
    pub skipped: usize,
    pub failed: Vec<PartitionWriteError>,
}

impl PartitionWriteReport {
    /// True when at least one pair failed to write.
    pub fn is_degraded(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Writes per-day, per-ticker CSV partitions under a data root.
#[derive(Debug, Clone)]
pub struct Partitioner {
    data_dir: PathBuf,
}

impl Partitioner {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Absolute location of a partition file.
    pub fn path_for(&self, key: &PartitionKey) -> PathBuf {
        self.data_dir.join(key.relative_path())
    }

    /// Write every (day, ticker) partition of the window starting at `range.start()`.
    pub fn partition(&self, table: &PriceTable, range: &DateRange) -> PartitionWriteReport {
        let mut report = PartitionWriteReport {
            days: range.window(PARTITION_WINDOW_DAYS).collect(),
            ..Default::default()
        };

        for &day in &report.days {
            for ticker in table.tickers() {
                let bars = table.bars_on(ticker, day);
                if bars.is_empty() {
                    report.skipped += 1;
                    continue;
                }

                let key = PartitionKey::new(day, ticker.clone());
                match self.write_partition(&key, bars) {
                    Ok(written) => {
                        debug!(key = %written.key, rows = written.rows, "partition written");
                        report.written.push(written);
                    }
                    Err(e) => {
                        warn!(error = %e, "partition write failed, continuing");
                        report.failed.push(e);
                    }
                }
            }
        }

        info!(
            days = report.days.len(),
            written = report.written.len(),
            skipped = report.skipped,
            failed = report.failed.len(),
            "partitioning complete"
        );
        report
    }

    fn write_partition(
        &self,
        key: &PartitionKey,
        bars: &[PriceBar],
    ) -> Result<WrittenPartition, PartitionWriteError> {
        let fail = |source: io::Error| PartitionWriteError {
            key: key.clone(),
            source,
        };

        let contents = render_csv(bars).map_err(fail)?;
        let path = self.path_for(key);
        if let Some(day_dir) = path.parent() {
            fs::create_dir_all(day_dir).map_err(fail)?;
        }

        let tmp_path = path.with_extension("csv.tmp");
        fs::write(&tmp_path, &contents).map_err(fail)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            fail(e)
        })?;

        Ok(WrittenPartition {
            key: key.clone(),
            path,
            rows: bars.len(),
            digest: blake3::hash(&contents).to_hex().to_string(),
        })
    }
}

/// Render bars as partition CSV.
///
/// Floats use Rust's shortest round-trip formatting, so the same bars always
/// render to the same bytes.
pub fn render_csv(bars: &[PriceBar]) -> io::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER).map_err(io::Error::other)?;
    for b in bars {
        wtr.write_record([
            b.date.format("%Y-%m-%d").to_string(),
            b.open.to_string(),
            b.high.to_string(),
            b.low.to_string(),
            b.close.to_string(),
            b.adj_close.to_string(),
            b.volume.to_string(),
        ])
        .map_err(io::Error::other)?;
    }
    wtr.into_inner().map_err(|e| io::Error::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ticker;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> PriceBar {
        PriceBar {
            date: day(d),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            adj_close: close,
            volume: 1_500,
        }
    }

    fn t(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    #[test]
    fn csv_layout() {
        let csv = String::from_utf8(render_csv(&[bar(4, 10.25)]).unwrap()).unwrap();
        assert_eq!(
            csv,
            "Date,Open,High,Low,Close,Adj Close,Volume\n2024-03-04,9.75,11.25,9.25,10.25,10.25,1500\n"
        );
    }

    #[test]
    fn writes_only_days_with_bars() {
        let dir = tempfile::tempdir().unwrap();
        let partitioner = Partitioner::new(dir.path());
        let table = PriceTable::from_series(vec![(t("AAA"), vec![bar(4, 10.0), bar(6, 11.0)])]);
        let range = DateRange::new(day(4), day(11)).unwrap();

        let report = partitioner.partition(&table, &range);

        assert_eq!(report.days.len(), 7);
        assert_eq!(report.written.len(), 2);
        assert_eq!(report.skipped, 5);
        assert!(!report.is_degraded());
        assert!(dir.path().join("2024-03-04/AAA.csv").is_file());
        assert!(dir.path().join("2024-03-06/AAA.csv").is_file());
        assert!(!dir.path().join("2024-03-05").exists());
    }

    #[test]
    fn rewrite_overwrites_instead_of_appending() {
        let dir = tempfile::tempdir().unwrap();
        let partitioner = Partitioner::new(dir.path());
        let range = DateRange::new(day(4), day(5)).unwrap();

        let first = PriceTable::from_series(vec![(t("AAA"), vec![bar(4, 10.0)])]);
        partitioner.partition(&first, &range);
        let second = PriceTable::from_series(vec![(t("AAA"), vec![bar(4, 12.0)])]);
        partitioner.partition(&second, &range);

        let content = fs::read_to_string(dir.path().join("2024-03-04/AAA.csv")).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains(",12,"));
        assert!(!dir.path().join("2024-03-04/AAA.csv.tmp").exists());
    }

    #[test]
    fn one_failed_pair_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the target path makes the rename fail.
        fs::create_dir_all(dir.path().join("2024-03-04/AAA.csv")).unwrap();

        let partitioner = Partitioner::new(dir.path());
        let table = PriceTable::from_series(vec![
            (t("AAA"), vec![bar(4, 10.0), bar(5, 10.5)]),
            (t("BBB"), vec![bar(4, 20.0)]),
        ]);
        let range = DateRange::new(day(4), day(11)).unwrap();

        let report = partitioner.partition(&table, &range);

        assert!(report.is_degraded());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, PartitionKey::new(day(4), t("AAA")));
        assert_eq!(report.written.len(), 2);
        assert!(dir.path().join("2024-03-04/BBB.csv").is_file());
        assert!(dir.path().join("2024-03-05/AAA.csv").is_file());
        assert!(!dir.path().join("2024-03-04/AAA.csv.tmp").exists());
    }
}
