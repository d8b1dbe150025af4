use std::ops::RangeInclusive;

use thiserror::Error;

/// Accepted per-question time budget, in seconds.
pub const SECONDS_PER_QUESTION: RangeInclusive<u32> = 10..=300;

/// Defaults offered by the quiz selector.
pub const DEFAULT_QUESTION_COUNT: usize = 5;
pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 60;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionConfigError {
    #[error("category name cannot be empty")]
    EmptyCategory,

    #[error("question count must be at least 1")]
    ZeroQuestions,

    #[error("seconds per question must be between 10 and 300, got {0}")]
    SecondsOutOfRange(u32),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultSummaryError {
    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Parameters chosen when starting a quiz. Fixed for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    category: String,
    question_count: usize,
    seconds_per_question: u32,
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns `SessionConfigError` for a blank category, a zero count, or a
    /// per-question budget outside [`SECONDS_PER_QUESTION`].
    pub fn new(
        category: impl Into<String>,
        question_count: usize,
        seconds_per_question: u32,
    ) -> Result<Self, SessionConfigError> {
        let category = category.into().trim().to_string();
        if category.is_empty() {
            return Err(SessionConfigError::EmptyCategory);
        }
        if question_count == 0 {
            return Err(SessionConfigError::ZeroQuestions);
        }
        if !SECONDS_PER_QUESTION.contains(&seconds_per_question) {
            return Err(SessionConfigError::SecondsOutOfRange(seconds_per_question));
        }
        Ok(Self {
            category,
            question_count,
            seconds_per_question,
        })
    }

    /// Config with the selector defaults for the given category.
    ///
    /// # Errors
    ///
    /// Returns `SessionConfigError::EmptyCategory` for a blank name.
    pub fn with_defaults(category: impl Into<String>) -> Result<Self, SessionConfigError> {
        Self::new(category, DEFAULT_QUESTION_COUNT, DEFAULT_SECONDS_PER_QUESTION)
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Requested count; the drawn count may be smaller for small pools.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    /// Total countdown budget for `drawn` questions.
    #[must_use]
    pub fn time_budget(&self, drawn: usize) -> u32 {
        let drawn = u32::try_from(drawn).unwrap_or(u32::MAX);
        self.seconds_per_question.saturating_mul(drawn)
    }
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Outcome of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSummary {
    score: u32,
    total: u32,
    elapsed_secs: u32,
}

impl ResultSummary {
    /// # Errors
    ///
    /// Returns `ResultSummaryError::ScoreExceedsTotal` if `score > total`.
    pub fn new(score: u32, total: u32, elapsed_secs: u32) -> Result<Self, ResultSummaryError> {
        if score > total {
            return Err(ResultSummaryError::ScoreExceedsTotal { score, total });
        }
        Ok(Self {
            score,
            total,
            elapsed_secs,
        })
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

    /// Score as a whole percentage of the total (0 for an empty total).
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            self.score * 100 / self.total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validates_bounds() {
        assert_eq!(
            SessionConfig::new("", 3, 60).unwrap_err(),
            SessionConfigError::EmptyCategory
        );
        assert_eq!(
            SessionConfig::new("Math", 0, 60).unwrap_err(),
            SessionConfigError::ZeroQuestions
        );
        assert_eq!(
            SessionConfig::new("Math", 3, 9).unwrap_err(),
            SessionConfigError::SecondsOutOfRange(9)
        );
        assert_eq!(
            SessionConfig::new("Math", 3, 301).unwrap_err(),
            SessionConfigError::SecondsOutOfRange(301)
        );
        assert!(SessionConfig::new("Math", 3, 10).is_ok());
        assert!(SessionConfig::new("Math", 3, 300).is_ok());
    }

    #[test]
    fn one_second_per_question_is_below_the_minimum() {
        assert_eq!(
            SessionConfig::new("Math", 5, 1).unwrap_err(),
            SessionConfigError::SecondsOutOfRange(1)
        );
        assert!(SessionConfig::new("Math", 5, 9).is_err());
        assert_eq!(SessionConfig::new("Math", 5, 10).unwrap().time_budget(5), 50);
        assert!(SessionConfig::new("Math", 5, 300).is_ok());
        assert!(SessionConfig::new("Math", 5, 301).is_err());
    }

    #[test]
    fn budget_scales_with_drawn_count() {
        let config = SessionConfig::new("Math", 5, 10).unwrap();
        assert_eq!(config.time_budget(3), 30);
        assert_eq!(config.time_budget(5), 50);
    }

    #[test]
    fn defaults_match_selector() {
        let config = SessionConfig::with_defaults("General").unwrap();
        assert_eq!(config.question_count(), DEFAULT_QUESTION_COUNT);
        assert_eq!(config.seconds_per_question(), DEFAULT_SECONDS_PER_QUESTION);
    }

    #[test]
    fn summary_rejects_impossible_score() {
        assert!(ResultSummary::new(4, 3, 0).is_err());
        let summary = ResultSummary::new(2, 4, 15).unwrap();
        assert_eq!(summary.percent(), 50);
        assert_eq!(summary.elapsed_secs(), 15);
    }
}
