use common::{JournalEntry, Report, UnsetOutcomePolicy};

/// Outcome label that counts as a win, compared case-insensitively.
const WIN_MARKER: &str = "win";

/// Derive aggregate statistics from the journal contents.
///
/// `total_trades` is the entry count. The win rate is computed over the
/// countable entries: recorded outcomes always count, unset outcomes count
/// according to `policy`. Returns `Report::NoData` when the journal is
/// empty, or when the exclude policy leaves nothing to divide by. Never a
/// division error.
pub fn compute(entries: &[JournalEntry], policy: UnsetOutcomePolicy) -> Report {
    let mut wins = 0usize;
    let mut counted = 0usize;

    for entry in entries {
        match entry.result.as_deref() {
            Some(label) => {
                counted += 1;
                if label.eq_ignore_ascii_case(WIN_MARKER) {
                    wins += 1;
                }
            }
            None => match policy {
                UnsetOutcomePolicy::Win => {
                    counted += 1;
                    wins += 1;
                }
                UnsetOutcomePolicy::Loss => {
                    counted += 1;
                }
                UnsetOutcomePolicy::Exclude => {}
            },
        }
    }

    if counted == 0 {
        return Report::NoData;
    }

    Report::Stats {
        total_trades: entries.len(),
        win_rate: 100.0 * wins as f64 / counted as f64,
    }
}
