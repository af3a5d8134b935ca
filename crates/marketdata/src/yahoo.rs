use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use common::{Bar, BarProvider, BarSeries, Error, InstrumentSpec, Result};

const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Historical OHLC provider backed by the Yahoo Finance chart API.
/// Unauthenticated read-only queries; used in live feed mode.
pub struct YahooClient {
    http: Client,
}

impl YahooClient {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .user_agent("Mozilla/5.0 (compatible; scoutbot/0.1)")
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn get_chart(&self, spec: &InstrumentSpec) -> Result<ChartResult> {
        let url = format!(
            "{BASE_URL}/v8/finance/chart/{}?range={}&interval={}",
            spec.symbol, spec.lookback, spec.interval
        );
        debug!(symbol = %spec.symbol, url = %url, "Fetching bar history");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::MarketData(format!(
                "chart query for '{}' failed: HTTP {status}: {body}",
                spec.symbol
            )));
        }

        let parsed: ChartResponse = serde_json::from_str(&body)?;
        if let Some(err) = parsed.chart.error {
            return Err(Error::MarketData(format!(
                "chart query for '{}' failed: {err}",
                spec.symbol
            )));
        }
        parsed
            .chart
            .result
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| {
                Error::MarketData(format!("chart query for '{}' returned no result", spec.symbol))
            })
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BarProvider for YahooClient {
    async fn fetch_bars(&self, spec: &InstrumentSpec) -> Result<BarSeries> {
        let chart = self.get_chart(spec).await?;
        let quote = chart
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::MarketData(format!("no quote block for '{}'", spec.symbol))
            })?;

        // Yahoo pads rows with nulls for halted intervals; those rows carry
        // no OHLC and are skipped rather than fabricated.
        let mut bars = Vec::with_capacity(chart.timestamp.len());
        let mut skipped = 0usize;
        for (i, &ts) in chart.timestamp.iter().enumerate() {
            let row = (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
                Utc.timestamp_opt(ts, 0).single(),
            );
            match row {
                (Some(open), Some(high), Some(low), Some(close), Some(timestamp)) => {
                    bars.push(Bar {
                        instrument_id: spec.symbol.clone(),
                        timestamp,
                        open,
                        high,
                        low,
                        close,
                    });
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(symbol = %spec.symbol, skipped, "Skipped incomplete bar rows");
        }

        BarSeries::from_bars(spec.symbol.clone(), bars)
    }
}

// ── Chart API response shapes ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}
