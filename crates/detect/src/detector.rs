use chrono::Utc;

use common::{Bar, BarSeries, SignalEvent, SignalKind};

use crate::config::DetectorConfig;

/// Scan a bar series for structural signals.
///
/// Lazy and pure: bars are evaluated one adjacent pair at a time, no I/O,
/// no allocation beyond the events themselves. Both rules look back exactly
/// one bar, so the first bar of a series can never fire and a series shorter
/// than two bars yields nothing.
///
/// The two rules are independent. A bar satisfying both yields two distinct
/// events for that bar, break-of-structure first.
pub fn scan<'a>(
    series: &'a BarSeries,
    cfg: &'a DetectorConfig,
) -> impl Iterator<Item = SignalEvent> + 'a {
    series.bars().windows(2).flat_map(move |pair| {
        let (prev, cur) = (&pair[0], &pair[1]);
        let mut events = Vec::with_capacity(2);

        if cur.close > prev.close {
            events.push(make_event(cur, SignalKind::BreakOfStructure));
        }
        // Strict inequality: a gap exactly at the threshold does not fire.
        if cur.high - prev.low > cfg.fvg_threshold {
            events.push(make_event(cur, SignalKind::FairValueGap));
        }

        events
    })
}

fn make_event(bar: &Bar, kind: SignalKind) -> SignalEvent {
    SignalEvent {
        instrument_id: bar.instrument_id.clone(),
        bar_timestamp: bar.timestamp,
        price: bar.close,
        kind,
        detected_at: Utc::now(),
        result: None,
    }
}
