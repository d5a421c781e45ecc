//! Close-to-close performance ranking.
//!
//! For every ticker with at least two bars, the change from its first to its
//! last close is ranked descending. Ties keep table order (stable sort, no
//! secondary key). `top` is the head of the ranking and `bottom` its tail,
//! both taken from the same sequence, so with fewer than `2 * N` qualifying
//! tickers the two lists share entries.

use crate::domain::{PerformanceRecord, PriceTable, RankingReport};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{info, warn};

/// How many entries each side of the report carries by default.
pub const DEFAULT_TOP_N: usize = 3;

/// The table cannot be ranked at all. Fatal for a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("price table has no bars")]
    EmptyTable,

    #[error("no ticker has the two bars needed for a change ({tickers} ticker(s) in table)")]
    NoQualifyingTickers { tickers: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceAnalyzer {
    top_n: usize,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl PerformanceAnalyzer {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn analyze(&self, table: &PriceTable) -> Result<RankingReport, AnalysisError> {
        let as_of_date = table.latest_date().ok_or(AnalysisError::EmptyTable)?;

        let mut ranked = performance_records(table);
        if ranked.is_empty() {
            return Err(AnalysisError::NoQualifyingTickers {
                tickers: table.len(),
            });
        }
        rank(&mut ranked);

        let top: Vec<_> = ranked.iter().take(self.top_n).cloned().collect();
        let bottom = ranked[ranked.len().saturating_sub(self.top_n)..].to_vec();

        info!(
            %as_of_date,
            qualifying = ranked.len(),
            best = %top.first().map_or("-", |r| r.ticker.as_str()),
            worst = %bottom.last().map_or("-", |r| r.ticker.as_str()),
            "ranking complete"
        );

        Ok(RankingReport {
            as_of_date,
            top,
            bottom,
        })
    }
}

/// `(last_close - first_close) / first_close * 100`.
pub fn pct_change(first_close: f64, last_close: f64) -> f64 {
    (last_close - first_close) / first_close * 100.0
}

/// Records for every qualifying ticker, in table order.
///
/// Tickers with a non-finite change (zero or missing first close) are left
/// out: they cannot be ordered.
pub fn performance_records(table: &PriceTable) -> Vec<PerformanceRecord> {
    table
        .iter()
        .filter_map(|(ticker, bars)| {
            let (first, last) = match bars {
                [first, .., last] => (first, last),
                _ => return None,
            };
            let change = pct_change(first.close, last.close);
            if !change.is_finite() {
                warn!(%ticker, first = first.close, last = last.close, "unrankable close series");
                return None;
            }
            Some(PerformanceRecord {
                ticker: ticker.clone(),
                pct_change: change,
            })
        })
        .collect()
}

/// Stable descending sort by change.
pub fn rank(records: &mut [PerformanceRecord]) {
    records.sort_by(|a, b| {
        b.pct_change
            .partial_cmp(&a.pct_change)
            .unwrap_or(Ordering::Equal)
    });
}
