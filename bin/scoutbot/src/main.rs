use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{BarProvider, Config, FeedMode, InstrumentSpec, Result};
use detect::{DetectorConfig, ScanFileConfig};
use dispatch::{AdvisoryClient, Dispatcher, TelegramNotifier};
use journal::{compute, Journal};
use marketdata::{ReplayProvider, YahooClient};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(mode = %cfg.feed_mode, "ScoutBot starting");

    let scan_cfg = ScanFileConfig::load(&cfg.scan_config_path);
    info!(
        instruments = scan_cfg.instruments.len(),
        fvg_threshold = scan_cfg.detector.fvg_threshold,
        "Scan config loaded"
    );

    // ── Journal ───────────────────────────────────────────────────────────────
    let journal = Arc::new(Journal::new(&cfg.journal_path));
    journal
        .initialize()
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize journal: {e}"));
    info!(path = %cfg.journal_path, "Journal ready");

    // ── Bar provider (injected based on FEED_MODE) ────────────────────────────
    let provider: Arc<dyn BarProvider> = match cfg.feed_mode {
        FeedMode::Live => {
            info!("Live feed mode — using YahooClient");
            Arc::new(YahooClient::new())
        }
        FeedMode::Replay => {
            info!(path = %cfg.replay_data_path, "Replay feed mode — using ReplayProvider");
            Arc::new(ReplayProvider::new(&cfg.replay_data_path))
        }
    };

    // ── Optional collaborators ────────────────────────────────────────────────
    let mut dispatcher = Dispatcher::new(Duration::from_secs(cfg.dispatch_timeout_secs));
    match &cfg.telegram_token {
        Some(token) if !cfg.telegram_chat_ids.is_empty() => {
            info!(chats = cfg.telegram_chat_ids.len(), "Telegram alerts enabled");
            dispatcher.register(Arc::new(TelegramNotifier::new(
                token.clone(),
                cfg.telegram_chat_ids.clone(),
            )));
        }
        _ => info!("Telegram alerts disabled (no token or chat IDs configured)"),
    }
    match &cfg.openai_api_key {
        Some(key) => {
            info!(model = %cfg.advisory_model, "AI advisory enabled");
            dispatcher.register(Arc::new(AdvisoryClient::new(
                key.clone(),
                cfg.advisory_model.clone(),
            )));
        }
        None => info!("AI advisory disabled (no API key configured)"),
    }
    let dispatcher = Arc::new(dispatcher);

    // ── Per-instrument scans ──────────────────────────────────────────────────
    let mut tasks = JoinSet::new();
    for spec in scan_cfg.instruments.clone() {
        let provider = provider.clone();
        let journal = journal.clone();
        let dispatcher = dispatcher.clone();
        let detector = scan_cfg.detector.clone();
        tasks.spawn(async move {
            let symbol = spec.symbol.clone();
            let outcome = scan_instrument(spec, detector, provider, journal, dispatcher).await;
            (symbol, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((symbol, Ok(journaled))) => {
                info!(symbol = %symbol, signals = journaled, "Instrument scan complete");
            }
            Ok((symbol, Err(e))) => {
                error!(symbol = %symbol, error = %e, "Instrument scan failed");
            }
            Err(e) => error!(error = %e, "Scan task panicked"),
        }
    }

    // ── Report ────────────────────────────────────────────────────────────────
    match journal.read_all().await {
        Ok(entries) => info!("{}", compute(&entries, scan_cfg.report.unset_outcome)),
        Err(e) => error!(error = %e, "Failed to read journal for reporting"),
    }
}

/// Scan one instrument end to end and return how many signals were
/// journaled.
///
/// One fetch per instrument; the validated series is the single view used
/// for detection. Each event is offered to the external consumers (best
/// effort) and appended to the journal; a storage failure on one append is
/// logged and that event skipped, the remaining events still processed.
async fn scan_instrument(
    spec: InstrumentSpec,
    detector: DetectorConfig,
    provider: Arc<dyn BarProvider>,
    journal: Arc<Journal>,
    dispatcher: Arc<Dispatcher>,
) -> Result<usize> {
    let series = provider.fetch_bars(&spec).await?;
    info!(symbol = %spec.symbol, bars = series.len(), "Bars fetched");

    let mut journaled = 0usize;
    for event in detect::scan(&series, &detector) {
        dispatcher.offer(&event).await;
        match journal.append(&event).await {
            Ok(_) => journaled += 1,
            Err(e) => warn!(
                symbol = %spec.symbol,
                kind = %event.kind,
                error = %e,
                "Failed to journal signal — continuing"
            ),
        }
    }
    Ok(journaled)
}
