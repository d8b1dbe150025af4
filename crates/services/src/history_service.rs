use std::sync::Arc;

use quiz_core::model::{HistoryEntry, HistoryLog};
use storage::repository::KeyValueRepository;

use crate::error::HistoryError;

/// Storage key holding the serialized score history.
pub const HISTORY_KEY: &str = "quiz_app_scores_v2";

/// Loads and persists the bounded score history as one JSON slot.
#[derive(Clone)]
pub struct HistoryService {
    repo: Arc<dyn KeyValueRepository>,
    key: String,
}

impl HistoryService {
    #[must_use]
    pub fn new(repo: Arc<dyn KeyValueRepository>) -> Self {
        Self {
            repo,
            key: HISTORY_KEY.to_string(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored history.
    ///
    /// Never fails: a missing slot, a storage error, or an unreadable payload
    /// all yield an empty log.
    pub async fn load(&self) -> HistoryLog {
        let raw = match self.repo.get_value(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return HistoryLog::new(),
            Err(err) => {
                log::warn!("score history unavailable, starting empty: {err}");
                return HistoryLog::new();
            }
        };

        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(entries) => HistoryLog::from_entries(entries),
            Err(err) => {
                log::warn!("discarding unreadable score history: {err}");
                HistoryLog::new()
            }
        }
    }

    /// Overwrite the stored history with `log`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if encoding or the storage write fails.
    pub async fn save(&self, log: &HistoryLog) -> Result<(), HistoryError> {
        let raw = serde_json::to_string(log)?;
        self.repo.put_value(&self.key, &raw).await?;
        log::debug!("saved {} history entries", log.len());
        Ok(())
    }

    /// Persist an empty history.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the storage write fails.
    pub async fn clear(&self) -> Result<(), HistoryError> {
        self.save(&HistoryLog::new()).await
    }
}
