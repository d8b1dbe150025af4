use std::path::Path;
use std::sync::Arc;

use quiz_core::model::QuestionBank;
use storage::repository::Storage;

use crate::Clock;
use crate::bank_loader::load_bank_file;
use crate::error::AppServicesError;
use crate::history_service::HistoryService;
use crate::sessions::QuizController;

/// Assembles app-facing services over one storage backend and question bank.
#[derive(Clone)]
pub struct AppServices {
    bank: Arc<QuestionBank>,
    history: Arc<HistoryService>,
    quiz: QuizController,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// Uses the bank at `bank_path` when given, otherwise the built-in bank.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or bank loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        bank_path: Option<&Path>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let bank = match bank_path {
            Some(path) => load_bank_file(path).await?,
            None => QuestionBank::builtin(),
        };
        Ok(Self::from_storage(&storage, clock, bank).await)
    }

    /// Build services over an already-open storage backend.
    pub async fn from_storage(storage: &Storage, clock: Clock, bank: QuestionBank) -> Self {
        let bank = Arc::new(bank);
        let history = Arc::new(HistoryService::new(Arc::clone(&storage.slots)));
        let quiz = QuizController::new(clock, Arc::clone(&bank), Arc::clone(&history)).await;

        Self {
            bank,
            history,
            quiz,
        }
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn quiz(&self) -> QuizController {
        self.quiz.clone()
    }
}
