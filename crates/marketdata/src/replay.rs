use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use common::{Bar, BarProvider, BarSeries, Error, InstrumentSpec, Result};

/// Fixture-backed provider for offline runs and tests.
///
/// Reads a JSON file mapping each symbol to its bar rows. The offline
/// counterpart of `YahooClient`, selected by `FEED_MODE=replay`; no network
/// traffic ever leaves this provider.
pub struct ReplayProvider {
    path: PathBuf,
}

/// One fixture row. `instrument_id` is implied by the map key.
#[derive(Debug, Deserialize)]
struct ReplayBar {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl ReplayProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!(path = %path.display(), "ReplayProvider initialized");
        Self { path }
    }

    fn series_from_json(symbol: &str, json: &str) -> Result<BarSeries> {
        let mut fixture: HashMap<String, Vec<ReplayBar>> = serde_json::from_str(json)?;
        let rows = fixture.remove(symbol).ok_or_else(|| {
            Error::MarketData(format!("replay fixture has no data for '{symbol}'"))
        })?;

        let bars = rows
            .into_iter()
            .map(|r| Bar {
                instrument_id: symbol.to_string(),
                timestamp: r.timestamp,
                open: r.open,
                high: r.high,
                low: r.low,
                close: r.close,
            })
            .collect();

        BarSeries::from_bars(symbol, bars)
    }
}

#[async_trait]
impl BarProvider for ReplayProvider {
    async fn fetch_bars(&self, spec: &InstrumentSpec) -> Result<BarSeries> {
        let json = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::MarketData(format!(
                "cannot read replay fixture '{}': {e}",
                self.path.display()
            ))
        })?;
        Self::series_from_json(&spec.symbol, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "ES=F": [
            { "timestamp": "2024-01-02T14:30:00Z", "open": 100.0, "high": 100.5, "low": 99.2, "close": 100.0 },
            { "timestamp": "2024-01-02T14:35:00Z", "open": 101.0, "high": 106.0, "low": 100.5, "close": 105.0 }
        ]
    }"#;

    fn spec(symbol: &str) -> InstrumentSpec {
        InstrumentSpec {
            symbol: symbol.into(),
            interval: "5m".into(),
            lookback: "30d".into(),
        }
    }

    #[test]
    fn fixture_parses_into_a_validated_series() {
        let series = ReplayProvider::series_from_json("ES=F", FIXTURE).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.instrument_id(), "ES=F");
        assert_eq!(series.bars()[1].close, 105.0);
    }

    #[test]
    fn unknown_symbol_is_a_market_data_error() {
        let err = ReplayProvider::series_from_json("NQ=F", FIXTURE).unwrap_err();
        assert!(matches!(err, Error::MarketData(_)));
    }

    #[test]
    fn malformed_fixture_rows_are_rejected() {
        let bad = r#"{
            "ES=F": [
                { "timestamp": "2024-01-02T14:30:00Z", "open": 100.0, "high": 99.0, "low": 101.0, "close": 100.0 }
            ]
        }"#;
        let err = ReplayProvider::series_from_json("ES=F", bad).unwrap_err();
        assert!(matches!(err, Error::MalformedBar { .. }));
    }

    #[tokio::test]
    async fn fetch_bars_reads_the_fixture_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.json");
        std::fs::write(&path, FIXTURE).unwrap();

        let provider = ReplayProvider::new(&path);
        let series = provider.fetch_bars(&spec("ES=F")).await.unwrap();
        assert_eq!(series.len(), 2);
    }

    #[tokio::test]
    async fn missing_fixture_file_is_a_market_data_error() {
        let provider = ReplayProvider::new("/nonexistent/replay.json");
        let err = provider.fetch_bars(&spec("ES=F")).await.unwrap_err();
        assert!(matches!(err, Error::MarketData(_)));
    }
}
