use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::session::ResultSummary;

/// Maximum number of entries kept in the score history.
pub const HISTORY_LIMIT: usize = 50;

/// One saved quiz result.
///
/// Serialized as `{ at, category, score, total, time }` with `at` in epoch
/// milliseconds and `time` in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    at: DateTime<Utc>,
    category: String,
    score: u32,
    total: u32,
    #[serde(rename = "time")]
    elapsed_secs: u32,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(at: DateTime<Utc>, category: impl Into<String>, summary: &ResultSummary) -> Self {
        Self {
            at,
            category: category.into(),
            score: summary.score(),
            total: summary.total(),
            elapsed_secs: summary.elapsed_secs(),
        }
    }

    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }
}

/// Past results, newest first, never longer than [`HISTORY_LIMIT`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from stored entries, enforcing the length cap.
    #[must_use]
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.truncate(HISTORY_LIMIT);
        Self { entries }
    }

    /// Prepend an entry and drop the oldest beyond the cap.
    ///
    /// No de-duplication: saving the same result twice stores it twice.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
