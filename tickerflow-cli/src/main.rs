//! Tickerflow CLI: pipeline runs and partition inspection.
//!
//! Commands:
//! - `run`: execute one pipeline run (what the daily timer invokes)
//! - `universe`: print the resolved ticker list
//! - `status`: report partition days, file counts and sizes

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tickerflow_core::data::{
    DataProvider, JsonFileSource, Selection, SyntheticProvider, TickerRegistry, YahooProvider,
};
use tickerflow_runner::{
    FileReportPublisher, PipelineConfig, PipelineOrchestrator, RunOutcome, RunSummary,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tickerflow",
    about = "Tickerflow: daily OHLC ingest, partitioning and performance ranking"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one pipeline run: resolve, fetch, partition, analyze, publish.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference date (YYYY-MM-DD). Defaults to today's local date.
        #[arg(long)]
        as_of: Option<String>,

        /// Process only the first N tickers of the universe.
        #[arg(long)]
        limit: Option<usize>,

        /// Universe document, overriding `universe.path`.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Partition root, overriding `storage.data_dir`.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Report directory, overriding `storage.report_dir`.
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Use generated prices instead of Yahoo Finance (no network access).
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for `--synthetic`.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Print the tickers a run would process.
    Universe {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Universe document, overriding `universe.path`.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Show only the first N tickers.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Report partition days with file counts and sizes.
    Status {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Partition root, overriding `storage.data_dir`.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            as_of,
            limit,
            universe,
            data_dir,
            report_dir,
            synthetic,
            seed,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(path) = universe {
                config.universe.path = path;
            }
            if let Some(dir) = data_dir {
                config.storage.data_dir = dir;
            }
            if let Some(dir) = report_dir {
                config.storage.report_dir = dir;
            }
            run_pipeline(config, as_of.as_deref(), limit, synthetic, seed)
        }
        Commands::Universe {
            config,
            universe,
            limit,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(path) = universe {
                config.universe.path = path;
            }
            run_universe(&config, limit)
        }
        Commands::Status { config, data_dir } => {
            let config = load_config(config.as_deref())?;
            let data_dir = data_dir.unwrap_or(config.storage.data_dir);
            run_status(&data_dir)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let config = PipelineConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            info!(path = %path.display(), "config loaded");
            Ok(config)
        }
        None => {
            info!("no config file given, using defaults");
            Ok(PipelineConfig::default())
        }
    }
}

fn selection_override(limit: Option<usize>) -> Option<Selection> {
    limit.map(Selection::First)
}

fn run_pipeline(
    config: PipelineConfig,
    as_of: Option<&str>,
    limit: Option<usize>,
    synthetic: bool,
    seed: u64,
) -> Result<()> {
    let reference_date = match as_of {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --as-of date: {s}"))?,
        None => chrono::Local::now().date_naive(),
    };

    let provider: Box<dyn DataProvider> = if synthetic {
        Box::new(SyntheticProvider::new(seed))
    } else {
        Box::new(YahooProvider::new()?)
    };
    let source = JsonFileSource::new(&config.universe.path);
    let publisher = FileReportPublisher::new(&config.storage.report_dir);
    info!(
        %reference_date,
        provider = provider.name(),
        universe = %config.universe.path.display(),
        data_dir = %config.storage.data_dir.display(),
        "starting pipeline run"
    );

    let summary = PipelineOrchestrator::new(config, &source, provider.as_ref(), &publisher)
        .run(reference_date, selection_override(limit))?;

    if let RunOutcome::DownloadAborted { attempts, .. } = &summary.outcome {
        warn!(attempts, "run ended without output after exhausting fetch attempts");
    }
    print_summary(&summary);
    Ok(())
}

fn run_universe(config: &PipelineConfig, limit: Option<usize>) -> Result<()> {
    let source = JsonFileSource::new(&config.universe.path);
    let selection = selection_override(limit).unwrap_or_else(|| config.universe.selection());
    let tickers = TickerRegistry::resolve(&source, selection)?;

    println!(
        "Universe: {} ({} tickers, {:?})",
        config.universe.path.display(),
        tickers.len(),
        selection
    );
    for ticker in &tickers {
        println!("  {ticker}");
    }
    Ok(())
}

fn run_status(data_dir: &Path) -> Result<()> {
    if !data_dir.exists() {
        println!("Data directory does not exist: {}", data_dir.display());
        return Ok(());
    }

    let mut rows: Vec<(NaiveDate, usize, u64)> = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let Ok(date) = NaiveDate::parse_from_str(&name, "%Y-%m-%d") else {
            continue;
        };
        let (files, size) = csv_stats(&entry.path());
        rows.push((date, files, size));
    }

    if rows.is_empty() {
        println!("No partitions under {}", data_dir.display());
        return Ok(());
    }
    rows.sort_by_key(|(date, _, _)| *date);

    let total_files: usize = rows.iter().map(|(_, files, _)| files).sum();
    let total_size: u64 = rows.iter().map(|(_, _, size)| size).sum();

    println!("Data directory: {}", data_dir.display());
    println!(
        "Days: {}, files: {}, total size: {}",
        rows.len(),
        total_files,
        format_size(total_size)
    );
    println!();
    println!("{:<12} {:>7} {:>10}", "Day", "Files", "Size");
    println!("{}", "-".repeat(31));
    for (date, files, size) in &rows {
        println!("{:<12} {:>7} {:>10}", date.to_string(), files, format_size(*size));
    }
    Ok(())
}

/// Number and total size of `.csv` files directly under `path`.
fn csv_stats(path: &Path) -> (usize, u64) {
    let mut files = 0usize;
    let mut size = 0u64;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            if entry.path().extension().is_some_and(|ext| ext == "csv") {
                if let Ok(meta) = entry.metadata() {
                    files += 1;
                    size += meta.len();
                }
            }
        }
    }
    (files, size)
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== Pipeline Run ===");
    println!("Reference date: {}", summary.reference_date);
    println!("Window:         {}", summary.range);
    println!("Tickers:        {}", summary.tickers.len());
    println!("Fetch attempts: {}", summary.fetch_attempts);

    match &summary.outcome {
        RunOutcome::Completed {
            partitions,
            ranking,
            published,
        } => {
            println!("Status:         completed");
            println!();
            println!("--- Partitions ---");
            println!("Written:        {}", partitions.written.len());
            println!("Skipped:        {}", partitions.skipped);
            println!("Failed:         {}", partitions.failed.len());
            for failure in &partitions.failed {
                println!("  {failure}");
            }
            println!();
            println!("--- Ranking (as of {}) ---", ranking.as_of_date);
            println!("Top:");
            for record in &ranking.top {
                println!("  {:<10} {:>+8.2}%", record.ticker.as_str(), record.pct_change);
            }
            println!("Bottom:");
            for record in &ranking.bottom {
                println!("  {:<10} {:>+8.2}%", record.ticker.as_str(), record.pct_change);
            }
            println!();
            for artifact in &published.artifacts {
                println!("Report: {}", artifact.display());
            }
        }
        RunOutcome::DownloadAborted {
            attempts,
            last_error,
        } => {
            println!("Status:         download aborted after {attempts} attempts");
            println!("Last error:     {last_error}");
        }
        RunOutcome::Cancelled { before } => {
            println!("Status:         cancelled before {before}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn csv_stats_counts_only_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("AAA.csv"), "abc").unwrap();
        std::fs::write(dir.path().join("BBB.csv"), "de").unwrap();
        std::fs::write(dir.path().join("CCC.csv.tmp"), "leftover").unwrap();
        assert_eq!(csv_stats(dir.path()), (2, 5));
    }

    #[test]
    fn load_config_without_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn load_config_reads_file_and_reports_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[report]\ntop_n = 5\n").unwrap();
        assert_eq!(load_config(Some(&good)).unwrap().report.top_n, 5);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[fetch]\nmax_attempts = 0\n").unwrap();
        let err = load_config(Some(&bad)).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn limit_becomes_prefix_selection() {
        assert_eq!(selection_override(Some(5)), Some(Selection::First(5)));
        assert_eq!(selection_override(None), None);
    }
}
