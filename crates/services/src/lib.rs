#![forbid(unsafe_code)]

pub mod app_services;
pub mod bank_loader;
pub mod error;
pub mod history_service;
pub mod password_service;
pub mod sessions;
pub mod wifi_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use bank_loader::{load_bank_file, parse_bank_json};
pub use error::{AppServicesError, BankLoadError, HistoryError, QuizError};
pub use history_service::{HISTORY_KEY, HistoryService};
pub use password_service::PasswordService;
pub use sessions::{
    AnswerOutcome, Direction, MapState, Phase, QuestionMapItem, QuestionView, QuizController,
    QuizSession, QuizStatus, SessionProgress, TickOutcome,
};
pub use wifi_service::{CommandOutput, CommandRunner, SystemCommandRunner, WifiService};
