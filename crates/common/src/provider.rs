use async_trait::async_trait;

use crate::{BarSeries, InstrumentSpec, Result};

/// Abstraction over the market-data source.
///
/// `YahooClient` implements this for live runs.
/// `ReplayProvider` implements this for offline fixture playback.
///
/// Each instrument is fetched exactly once per scan; the returned series is
/// the single read-only view shared by detection and any external consumer
/// of the same data.
#[async_trait]
pub trait BarProvider: Send + Sync {
    /// Fetch the full bar history for one instrument, validated into a
    /// `BarSeries`. A provider must never hand back a series that violates
    /// the bar invariants; malformed upstream rows surface as `MalformedBar`.
    async fn fetch_bars(&self, spec: &InstrumentSpec) -> Result<BarSeries>;
}
