use chrono::{DateTime, Utc};

use quiz_core::model::Question;

/// Snapshot of a running session, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub category: String,
    pub current: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining_secs: u32,
    pub budget_secs: u32,
    pub started_at: DateTime<Utc>,
}

/// The question under the cursor together with the recorded choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub question: Question,
    pub selected: Option<usize>,
}

/// How a question shows up in the question map overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Unanswered,
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionMapItem {
    pub index: usize,
    pub state: MapState,
    pub is_current: bool,
}
