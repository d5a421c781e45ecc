//! Pipeline configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! [storage]
//! data_dir = "data"
//! report_dir = "reports"
//!
//! [universe]
//! path = "tickers-list.json"
//! # limit = 12
//!
//! [window]
//! days = 7
//!
//! [fetch]
//! max_attempts = 3
//! retry_delay_secs = 60
//!
//! [report]
//! top_n = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tickerflow_core::analysis::DEFAULT_TOP_N;
use tickerflow_core::data::Selection;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub storage: StorageConfig,
    pub universe: UniverseConfig,
    pub window: WindowConfig,
    pub fetch: FetchConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the `<YYYY-MM-DD>/<TICKER>.csv` partition set.
    pub data_dir: PathBuf,
    /// Where ranking reports are published.
    pub report_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            report_dir: PathBuf::from("reports"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// JSON document `{"tickers": [...]}`.
    pub path: PathBuf,
    /// Process only the first `limit` tickers. `None` means the whole universe.
    pub limit: Option<usize>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tickers-list.json"),
            limit: None,
        }
    }
}

impl UniverseConfig {
    pub fn selection(&self) -> Selection {
        self.limit.map_or(Selection::All, Selection::First)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Fetch lookback in calendar days. Partitioning always covers the 7 days
    /// from the start of the lookback, whatever its length.
    pub days: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub retry_delay_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_secs: 60,
        }
    }
}

impl FetchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Entries in each of the top and bottom lists.
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.days == 0 {
            return Err(ConfigError::Invalid("window.days must be at least 1".into()));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "fetch.max_attempts must be at least 1".into(),
            ));
        }
        if self.report.top_n == 0 {
            return Err(ConfigError::Invalid("report.top_n must be at least 1".into()));
        }
        if self.universe.limit == Some(0) {
            return Err(ConfigError::Invalid(
                "universe.limit must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.window.days, 7);
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.retry_delay(), Duration::from_secs(60));
        assert_eq!(config.report.top_n, 3);
        assert_eq!(config.universe.selection(), Selection::All);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            [storage]
            data_dir = "/srv/prices"

            [universe]
            limit = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/prices"));
        assert_eq!(config.storage.report_dir, PathBuf::from("reports"));
        assert_eq!(config.universe.selection(), Selection::First(12));
        assert_eq!(config.universe.path, PathBuf::from("tickers-list.json"));
    }

    #[test]
    fn rejects_zero_values() {
        assert!(matches!(
            PipelineConfig::from_toml("[fetch]\nmax_attempts = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml("[window]\ndays = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml("[universe]\nlimit = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_bad_types() {
        assert!(matches!(
            PipelineConfig::from_toml("[fetch]\nmax_attempts = \"three\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let config = PipelineConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }
}
