//! Canonical in-memory representation of an OHLCV bar and of a fetched series.
//!
//! These are the output types of every [`DataProvider`](crate::providers::DataProvider)
//! implementation and the input of every [`DataSink`](crate::io::sink::DataSink).

use serde::{Deserialize, Serialize};

use crate::models::{pair::CurrencyPair, timeframe::TimeFrame};

/// A single OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time, seconds since the Unix epoch (UTC).
    pub time: i64,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume in the base (from) currency.
    pub volumefrom: f64,

    /// Volume in the quote (to) currency.
    pub volumeto: f64,
}

/// How much of the requested range a [`BarSeries`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coverage {
    /// Every bar the source has for the requested range is present.
    Complete,
    /// The requested start predates the source's history; the series
    /// begins at the earliest bar available.
    Truncated {
        requested_start: i64,
        available_from: i64,
    },
}

/// A complete, ascending, de-duplicated bar series for one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub pair: CurrencyPair,
    pub timeframe: TimeFrame,
    pub exchange: String,
    pub bars: Vec<Bar>,
    pub coverage: Coverage,
}

impl BarSeries {
    pub fn is_truncated(&self) -> bool {
        matches!(self.coverage, Coverage::Truncated { .. })
    }
}

/// Sorts bars ascending by `time` and keeps one bar per timestamp (the first
/// seen for that timestamp in the input order).
pub fn sort_dedup(bars: &mut Vec<Bar>) {
    bars.sort_by_key(|b| b.time);
    bars.dedup_by_key(|b| b.time);
}
