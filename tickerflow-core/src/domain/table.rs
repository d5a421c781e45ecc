//! PriceTable: the fetched result shared by partitioning and ranking.

use super::bar::PriceBar;
use super::ticker::Ticker;
use chrono::NaiveDate;
use serde::Serialize;

/// All bars for one ticker, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSeries {
    pub ticker: Ticker,
    pub bars: Vec<PriceBar>,
}

/// Ticker → ascending bar sequence, in request order.
///
/// The ticker order is the order the table was built from (the registry
/// order of the run). Rankings rely on it for tie-breaking, so the table
/// never re-sorts tickers. The table is immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceTable {
    series: Vec<TickerSeries>,
}

impl PriceTable {
    /// Build a table from `(ticker, bars)` pairs.
    ///
    /// Bars are stable-sorted by date. A ticker that appears twice keeps its
    /// first position and receives the bars of both entries.
    pub fn from_series<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Ticker, Vec<PriceBar>)>,
    {
        let mut series: Vec<TickerSeries> = Vec::new();
        for (ticker, bars) in entries {
            match series.iter_mut().find(|s| s.ticker == ticker) {
                Some(existing) => existing.bars.extend(bars),
                None => series.push(TickerSeries { ticker, bars }),
            }
        }
        for s in &mut series {
            s.bars.sort_by_key(|b| b.date);
        }
        Self { series }
    }

    /// Tickers in table order, including those with no bars.
    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.series.iter().map(|s| &s.ticker)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, &[PriceBar])> {
        self.series.iter().map(|s| (&s.ticker, s.bars.as_slice()))
    }

    pub fn bars(&self, ticker: &Ticker) -> Option<&[PriceBar]> {
        self.series
            .iter()
            .find(|s| &s.ticker == ticker)
            .map(|s| s.bars.as_slice())
    }

    /// Bars for `ticker` dated exactly `date` (usually zero or one).
    pub fn bars_on(&self, ticker: &Ticker, date: NaiveDate) -> &[PriceBar] {
        let Some(bars) = self.bars(ticker) else {
            return &[];
        };
        let lo = bars.partition_point(|b| b.date < date);
        let hi = bars.partition_point(|b| b.date <= date);
        &bars[lo..hi]
    }

    /// Number of tickers (with or without bars).
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True when the table carries no bars at all.
    pub fn is_empty(&self) -> bool {
        self.total_bars() == 0
    }

    pub fn total_bars(&self) -> usize {
        self.series.iter().map(|s| s.bars.len()).sum()
    }

    /// Latest bar date across every ticker.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.series
            .iter()
            .filter_map(|s| s.bars.last().map(|b| b.date))
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume: 1_000,
        }
    }

    fn t(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    #[test]
    fn preserves_ticker_order_and_sorts_bars() {
        let table = PriceTable::from_series(vec![
            (t("ZZZ"), vec![bar(5, 2.0), bar(4, 1.0)]),
            (t("AAA"), vec![bar(4, 3.0)]),
        ]);
        let order: Vec<_> = table.tickers().map(Ticker::as_str).collect();
        assert_eq!(order, ["ZZZ", "AAA"]);
        let zzz = table.bars(&t("ZZZ")).unwrap();
        assert_eq!(zzz[0].close, 1.0);
        assert_eq!(zzz[1].close, 2.0);
    }

    #[test]
    fn duplicate_ticker_entries_merge() {
        let table = PriceTable::from_series(vec![
            (t("AAA"), vec![bar(6, 2.0)]),
            (t("BBB"), vec![]),
            (t("AAA"), vec![bar(4, 1.0)]),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.bars(&t("AAA")).unwrap().len(), 2);
        assert_eq!(table.tickers().next().unwrap().as_str(), "AAA");
    }

    #[test]
    fn bars_on_selects_exact_day() {
        let table = PriceTable::from_series(vec![(t("AAA"), vec![bar(4, 1.0), bar(6, 2.0)])]);
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        assert_eq!(table.bars_on(&t("AAA"), day(4)).len(), 1);
        assert!(table.bars_on(&t("AAA"), day(5)).is_empty());
        assert!(table.bars_on(&t("MISSING"), day(4)).is_empty());
    }

    #[test]
    fn empty_series_do_not_count_as_data() {
        let table = PriceTable::from_series(vec![(t("AAA"), vec![])]);
        assert_eq!(table.len(), 1);
        assert!(table.is_empty());
        assert_eq!(table.latest_date(), None);
    }
}
