//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{BankError, ResultSummaryError, SessionConfigError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::sessions::Phase;

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("failed to encode score history: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the quiz session state machine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error(transparent)]
    Config(#[from] SessionConfigError),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("category {0:?} has no questions")]
    EmptyCategory(String),
    #[error("cannot {operation} while {phase}")]
    WrongPhase {
        operation: &'static str,
        phase: Phase,
    },
    #[error("question index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("choice {choice} is out of range (0..4)")]
    ChoiceOutOfRange { choice: usize },
    #[error(transparent)]
    Summary(#[from] ResultSummaryError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Errors emitted while loading a question bank document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("failed to read question bank: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed question bank: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] BankError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Bank(#[from] BankLoadError),
}
