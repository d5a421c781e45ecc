//! Ticker universe: the set of symbols a run processes.
//!
//! The universe is stored as a JSON document `{"tickers": ["AAA", ...]}`.
//! Order is meaningful: a bounded selection takes the first `n` entries as
//! the source lists them, and rankings break ties by this order.

use crate::domain::{InvalidTicker, Ticker};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Bad or missing ticker universe. Never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read universe source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed universe document: {0}")]
    Malformed(String),

    #[error("universe is empty")]
    Empty,

    #[error("duplicate ticker '{0}' in universe")]
    Duplicate(String),

    #[error(transparent)]
    InvalidTicker(#[from] InvalidTicker),

    #[error("selection must request at least one ticker")]
    EmptySelection,
}

/// Which part of the universe to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    /// The first `n` tickers in source order.
    First(usize),
}

/// Where the universe document comes from.
pub trait UniverseSource: Send + Sync {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    /// Load the raw document.
    fn load(&self) -> Result<String, ConfigurationError>;
}

/// Universe document on disk (e.g. `tickers-list.json`).
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UniverseSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<String, ConfigurationError> {
        std::fs::read_to_string(&self.path).map_err(|source| ConfigurationError::Read {
            path: self.path.clone(),
            source,
        })
    }
}

/// Universe document held in memory.
#[derive(Debug, Clone)]
pub struct InlineSource(pub String);

impl UniverseSource for InlineSource {
    fn describe(&self) -> String {
        "inline document".into()
    }

    fn load(&self) -> Result<String, ConfigurationError> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct UniverseDocument {
    tickers: Vec<String>,
}

/// A validated, ordered, duplicate-free ticker universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRegistry {
    tickers: Vec<Ticker>,
}

impl TickerRegistry {
    /// Parse and validate a `{"tickers": [...]}` document.
    pub fn from_json(document: &str) -> Result<Self, ConfigurationError> {
        let doc: UniverseDocument = serde_json::from_str(document)
            .map_err(|e| ConfigurationError::Malformed(e.to_string()))?;
        Self::from_symbols(doc.tickers)
    }

    /// Validate an ordered symbol list. Duplicates are rejected, not merged.
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut tickers = Vec::new();
        for symbol in symbols {
            let ticker = Ticker::new(symbol)?;
            if !seen.insert(ticker.clone()) {
                return Err(ConfigurationError::Duplicate(ticker.to_string()));
            }
            tickers.push(ticker);
        }
        if tickers.is_empty() {
            return Err(ConfigurationError::Empty);
        }
        Ok(Self { tickers })
    }

    /// Load and validate the universe from a source.
    pub fn load(source: &dyn UniverseSource) -> Result<Self, ConfigurationError> {
        Self::from_json(&source.load()?)
    }

    /// Load the universe and apply `selection` in one step.
    pub fn resolve(
        source: &dyn UniverseSource,
        selection: Selection,
    ) -> Result<Vec<Ticker>, ConfigurationError> {
        Self::load(source)?.select(selection)
    }

    /// Apply a selection. Order is the source order, never re-sorted.
    pub fn select(&self, selection: Selection) -> Result<Vec<Ticker>, ConfigurationError> {
        match selection {
            Selection::All => Ok(self.tickers.clone()),
            Selection::First(0) => Err(ConfigurationError::EmptySelection),
            Selection::First(n) => Ok(self.tickers.iter().take(n).cloned().collect()),
        }
    }
}
