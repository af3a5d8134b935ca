use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One OHLC sample for one instrument at one timestamp.
/// Produced by the data source; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub instrument_id: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// Check the OHLC invariants: `high >= low`, `high >= max(open, close)`,
    /// `low <= min(open, close)`.
    pub fn is_well_formed(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }
}

/// Ordered bar sequence for exactly one instrument.
///
/// Construction is the validation boundary: a `BarSeries` that exists is
/// guaranteed to hold well-formed bars of a single instrument, strictly
/// ascending by timestamp with no duplicates. Downstream code (the detector
/// in particular) relies on this and performs no checks of its own.
#[derive(Debug, Clone)]
pub struct BarSeries {
    instrument_id: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate and build a series. Fails with `MalformedBar` at the first
    /// offending bar; a partially-valid prefix is never returned.
    pub fn from_bars(instrument_id: impl Into<String>, bars: Vec<Bar>) -> Result<Self> {
        let instrument_id = instrument_id.into();

        for (i, bar) in bars.iter().enumerate() {
            if bar.instrument_id != instrument_id {
                let reason =
                    format!("bar {i} belongs to '{}', expected '{instrument_id}'", bar.instrument_id);
                return Err(Error::MalformedBar { instrument: instrument_id, reason });
            }
            if !bar.is_well_formed() {
                return Err(Error::MalformedBar {
                    instrument: instrument_id,
                    reason: format!(
                        "bar {i} at {} violates OHLC bounds (o={} h={} l={} c={})",
                        bar.timestamp, bar.open, bar.high, bar.low, bar.close
                    ),
                });
            }
            if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
                return Err(Error::MalformedBar {
                    instrument: instrument_id,
                    reason: format!(
                        "bar {i} timestamp {} is not after predecessor {}",
                        bar.timestamp,
                        bars[i - 1].timestamp
                    ),
                });
            }
        }

        Ok(Self { instrument_id, bars })
    }

    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Which structural rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    /// Current close exceeds the prior bar's close.
    BreakOfStructure,
    /// Current high exceeds the prior bar's low by more than the threshold.
    FairValueGap,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::BreakOfStructure => write!(f, "BreakOfStructure"),
            SignalKind::FairValueGap => write!(f, "FairValueGap"),
        }
    }
}

/// One detection. A bar satisfying both rules yields two of these,
/// one per kind; they are never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEvent {
    pub instrument_id: String,
    /// Timestamp of the bar that triggered the rule.
    pub bar_timestamp: DateTime<Utc>,
    /// Close of the triggering bar.
    pub price: f64,
    pub kind: SignalKind,
    /// Wall-clock time of detection, distinct from `bar_timestamp`.
    pub detected_at: DateTime<Utc>,
    /// Outcome label, unset at creation. Corrections are recorded as new
    /// journal entries with a distinguishing result, never by mutation.
    pub result: Option<String>,
}

/// The persisted form of a `SignalEvent`. One CSV row in the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Time the entry was written, assigned by the journal on append.
    pub logged_at: DateTime<Utc>,
    pub instrument_id: String,
    pub bar_timestamp: DateTime<Utc>,
    pub price: f64,
    pub kind: SignalKind,
    pub result: Option<String>,
}

/// Aggregate view over the journal. Computed fresh on each request,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Report {
    /// Nothing countable in the journal; reported explicitly instead of
    /// dividing by zero.
    NoData,
    Stats { total_trades: usize, win_rate: f64 },
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Report::NoData => write!(f, "no journal data"),
            Report::Stats { total_trades, win_rate } => {
                write!(f, "Total Trades: {total_trades}, Win Rate: {win_rate:.2}%")
            }
        }
    }
}

/// How the report treats journal entries whose `result` is still unset.
///
/// The original behavior counted unset outcomes as wins, which makes the win
/// rate meaningless until real outcomes are recorded. That bias is kept as
/// the explicit default here rather than silently baked into the math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsetOutcomePolicy {
    #[default]
    Win,
    Loss,
    Exclude,
}

/// One instrument to scan, as listed in the scan config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstrumentSpec {
    /// Data-source symbol, e.g. "ES=F".
    pub symbol: String,
    /// Bar interval, e.g. "5m".
    pub interval: String,
    /// History window, e.g. "30d".
    pub lookback: String,
}

/// Whether bars come from the live data source or a local fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    Live,
    Replay,
}

impl std::fmt::Display for FeedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedMode::Live => write!(f, "live"),
            FeedMode::Replay => write!(f, "replay"),
        }
    }
}
