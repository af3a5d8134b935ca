use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use common::{Error, JournalEntry, Result, SignalEvent};

/// Column order of the journal file. Written once at initialization and
/// never rewritten.
const HEADER: [&str; 6] = [
    "logged_at",
    "instrument_id",
    "bar_timestamp",
    "price",
    "kind",
    "result",
];

/// Append-only CSV journal of detected signals. The system of record for
/// reporting.
///
/// This is the single shared append point of the whole scan: the internal
/// mutex serializes writers so concurrent appends never interleave a row's
/// fields. There is no update or delete; corrections are appended as new
/// entries with a distinguishing `result`.
pub struct Journal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the journal file exists with its header row. Idempotent:
    /// safe on every process start, never truncates or alters existing
    /// entries.
    pub async fn initialize(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(storage)?;

        if file.metadata().map_err(storage)?.len() == 0 {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer.write_record(HEADER).map_err(storage)?;
            writer.flush().map_err(storage)?;
            info!(path = %self.path.display(), "Journal created");
        } else {
            debug!(path = %self.path.display(), "Journal already present");
        }
        Ok(())
    }

    /// Append one entry, assigning `logged_at`, and return the persisted
    /// form. Entries land in call order; fails only with
    /// `StorageUnavailable`.
    pub async fn append(&self, event: &SignalEvent) -> Result<JournalEntry> {
        let entry = JournalEntry {
            logged_at: Utc::now(),
            instrument_id: event.instrument_id.clone(),
            bar_timestamp: event.bar_timestamp,
            price: event.price,
            kind: event.kind,
            result: event.result.clone(),
        };

        let _guard = self.write_lock.lock().await;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(storage)?;

        let needs_header = file.metadata().map_err(storage)?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(HEADER).map_err(storage)?;
        }
        writer.serialize(&entry).map_err(storage)?;
        writer.flush().map_err(storage)?;

        debug!(
            instrument = %entry.instrument_id,
            kind = %entry.kind,
            price = entry.price,
            "Signal journaled"
        );
        Ok(entry)
    }

    /// Read every entry in append order. A just-initialized journal yields
    /// an empty vector, never an error.
    pub async fn read_all(&self) -> Result<Vec<JournalEntry>> {
        // Hold the lock so a read never observes a half-written row.
        let _guard = self.write_lock.lock().await;

        let file = File::open(&self.path).map_err(storage)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let mut entries = Vec::new();
        for row in reader.deserialize() {
            entries.push(row.map_err(storage)?);
        }
        Ok(entries)
    }
}

fn storage(e: impl std::fmt::Display) -> Error {
    Error::StorageUnavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::SignalKind;
    use std::sync::Arc;

    fn event(instrument: &str, ts_secs: i64, price: f64, kind: SignalKind) -> SignalEvent {
        SignalEvent {
            instrument_id: instrument.into(),
            bar_timestamp: Utc.timestamp_opt(ts_secs, 0).unwrap(),
            price,
            kind,
            detected_at: Utc::now(),
            result: None,
        }
    }

    #[tokio::test]
    async fn initialize_creates_header_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("journal.csv"));
        journal.initialize().await.unwrap();

        let content = std::fs::read_to_string(journal.path()).unwrap();
        assert_eq!(
            content.trim_end(),
            "logged_at,instrument_id,bar_timestamp,price,kind,result"
        );
        assert!(journal.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn initialize_is_idempotent_over_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("journal.csv"));
        journal.initialize().await.unwrap();
        journal
            .append(&event("ES=F", 0, 100.5, SignalKind::BreakOfStructure))
            .await
            .unwrap();

        let before = std::fs::read_to_string(journal.path()).unwrap();
        journal.initialize().await.unwrap();
        journal.initialize().await.unwrap();
        let after = std::fs::read_to_string(journal.path()).unwrap();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn append_then_read_all_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("journal.csv"));
        journal.initialize().await.unwrap();

        let events = vec![
            event("ES=F", 0, 100.5, SignalKind::BreakOfStructure),
            event("ES=F", 300, 101.25, SignalKind::FairValueGap),
            event("NQ=F", 300, 15_000.0, SignalKind::BreakOfStructure),
        ];
        for e in &events {
            journal.append(e).await.unwrap();
        }

        let entries = journal.read_all().await.unwrap();
        assert_eq!(entries.len(), 3);
        for (entry, original) in entries.iter().zip(&events) {
            assert_eq!(entry.instrument_id, original.instrument_id);
            assert_eq!(entry.bar_timestamp, original.bar_timestamp);
            assert_eq!(entry.price, original.price);
            assert_eq!(entry.kind, original.kind);
            assert_eq!(entry.result, original.result);
        }
    }

    #[tokio::test]
    async fn result_labels_survive_the_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("journal.csv"));
        journal.initialize().await.unwrap();

        let mut win = event("ES=F", 0, 100.5, SignalKind::BreakOfStructure);
        win.result = Some("win".into());
        let mut loss = event("ES=F", 300, 99.0, SignalKind::FairValueGap);
        loss.result = Some("loss".into());
        journal.append(&win).await.unwrap();
        journal.append(&loss).await.unwrap();
        journal
            .append(&event("ES=F", 600, 99.5, SignalKind::BreakOfStructure))
            .await
            .unwrap();

        let entries = journal.read_all().await.unwrap();
        assert_eq!(entries[0].result.as_deref(), Some("win"));
        assert_eq!(entries[1].result.as_deref(), Some("loss"));
        assert_eq!(entries[2].result, None);
    }

    #[tokio::test]
    async fn concurrent_appends_never_corrupt_rows() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Arc::new(Journal::new(dir.path().join("journal.csv")));
        journal.initialize().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16i64 {
            let journal = journal.clone();
            handles.push(tokio::spawn(async move {
                journal
                    .append(&event("ES=F", 300 * i, 100.0 + i as f64, SignalKind::FairValueGap))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let entries = journal.read_all().await.unwrap();
        assert_eq!(entries.len(), 16);
        // Every row parsed back cleanly with its fields intact.
        for entry in &entries {
            assert_eq!(entry.instrument_id, "ES=F");
            assert_eq!(entry.kind, SignalKind::FairValueGap);
        }
    }

    #[tokio::test]
    async fn read_all_without_initialization_reports_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("missing.csv"));
        let err = journal.read_all().await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
    }
}
