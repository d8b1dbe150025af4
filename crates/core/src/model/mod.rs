mod bank;
mod category;
mod history;
mod ids;
mod password;
mod question;
mod session;

pub use ids::QuestionId;

pub use bank::{BankError, QuestionBank};
pub use category::{Category, CategoryError};
pub use history::{HISTORY_LIMIT, HistoryEntry, HistoryLog};
pub use password::{DEFAULT_PASSWORD_LENGTH, PASSWORD_LENGTH, PasswordOptions, PasswordOptionsError};
pub use question::{CHOICE_COUNT, Question, QuestionError, QuestionRecord};
pub use session::{
    DEFAULT_QUESTION_COUNT, DEFAULT_SECONDS_PER_QUESTION, ResultSummary, ResultSummaryError,
    SECONDS_PER_QUESTION, SessionConfig, SessionConfigError,
};
