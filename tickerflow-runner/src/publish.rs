//! Ranking report publication.
//!
//! The report is published as a set of files keyed by its `as_of_date`:
//! - `top-performers-<date>.csv` / `worst-performers-<date>.csv`:
//!   `Ticker,Variation(%)` tables for external dashboards
//! - `ranking-<date>.json`: the full report
//! - `ranking-<date>.md`: human-readable summary
//!
//! Every file is written to `.tmp` and renamed into place, so a reader never
//! observes a half-written report.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tickerflow_core::domain::{PerformanceRecord, RankingReport};
use tracing::info;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to write report file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(String),
}

/// Where the report went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedReport {
    pub artifacts: Vec<PathBuf>,
}

/// Destination for ranking reports.
pub trait ReportPublisher: Send + Sync {
    fn publish(&self, report: &RankingReport) -> Result<PublishedReport, PublishError>;
}

/// Publishes reports as files under a directory.
#[derive(Debug, Clone)]
pub struct FileReportPublisher {
    report_dir: PathBuf,
}

impl FileReportPublisher {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }
}

impl ReportPublisher for FileReportPublisher {
    fn publish(&self, report: &RankingReport) -> Result<PublishedReport, PublishError> {
        fs::create_dir_all(&self.report_dir).map_err(|source| PublishError::Io {
            path: self.report_dir.clone(),
            source,
        })?;

        let date = report.as_of_date.format("%Y-%m-%d");
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| PublishError::Serialize(e.to_string()))?;
        let files = [
            (format!("top-performers-{date}.csv"), export_table_csv(&report.top)?),
            (format!("worst-performers-{date}.csv"), export_table_csv(&report.bottom)?),
            (format!("ranking-{date}.json"), json),
            (format!("ranking-{date}.md"), generate_markdown(report)),
        ];

        let mut artifacts = Vec::with_capacity(files.len());
        for (name, contents) in files {
            let path = self.report_dir.join(name);
            write_atomic(&path, contents.as_bytes())?;
            artifacts.push(path);
        }

        info!(
            as_of = %report.as_of_date,
            dir = %self.report_dir.display(),
            "ranking report published"
        );
        Ok(PublishedReport { artifacts })
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PublishError> {
    let io_err = |source: io::Error| PublishError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    fs::write(&tmp_path, contents).map_err(io_err)?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        io_err(e)
    })
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export one side of the ranking as a `Ticker,Variation(%)` table.
pub fn export_table_csv(records: &[PerformanceRecord]) -> Result<String, PublishError> {
    let to_err = |e: csv::Error| PublishError::Serialize(e.to_string());
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Ticker", "Variation(%)"]).map_err(to_err)?;
    for r in records {
        let variation = format!("{:.4}", r.pct_change);
        wtr.write_record([r.ticker.as_str(), variation.as_str()])
            .map_err(to_err)?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| PublishError::Serialize(e.to_string()))?;
    String::from_utf8(data).map_err(|e| PublishError::Serialize(e.to_string()))
}

// ─── Markdown ───────────────────────────────────────────────────────

/// Markdown summary with both tables.
pub fn generate_markdown(report: &RankingReport) -> String {
    let mut md = String::with_capacity(512);
    md.push_str(&format!("# Performance Report: {}\n\n", report.as_of_date));
    push_table(&mut md, "Top performers", &report.top);
    push_table(&mut md, "Worst performers", &report.bottom);
    md
}

fn push_table(md: &mut String, title: &str, records: &[PerformanceRecord]) {
    md.push_str(&format!("## {title}\n\n"));
    md.push_str("| Ticker | Variation (%) |\n");
    md.push_str("| --- | ---: |\n");
    for r in records {
        md.push_str(&format!("| {} | {:+.2} |\n", r.ticker, r.pct_change));
    }
    md.push('\n');
}
