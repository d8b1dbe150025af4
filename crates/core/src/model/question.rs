use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Number of choices every question carries.
pub const CHOICE_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} has {len} choices, expected 4")]
    ChoiceCount { id: QuestionId, len: usize },

    #[error("question {id} has an empty choice at position {index}")]
    EmptyChoice { id: QuestionId, index: usize },

    #[error("question {id} marks choice {answer} as correct, expected 0..4")]
    AnswerOutOfRange { id: QuestionId, answer: usize },
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Serialized shape of a question inside a bank document.
///
/// Field names follow the bank file format (`q` for the prompt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: u32,
    pub q: String,
    pub choices: Vec<String>,
    pub answer: usize,
}

impl QuestionRecord {
    /// Validate the record into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or a choice is blank, the choice
    /// count is not [`CHOICE_COUNT`], or the answer index is out of range.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = QuestionId::new(self.id);
        let prompt = self.q.trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }

        let len = self.choices.len();
        let choices: [String; CHOICE_COUNT] = self
            .choices
            .try_into()
            .map_err(|_| QuestionError::ChoiceCount { id, len })?;

        if let Some(index) = choices.iter().position(|c| c.trim().is_empty()) {
            return Err(QuestionError::EmptyChoice { id, index });
        }

        if self.answer >= CHOICE_COUNT {
            return Err(QuestionError::AnswerOutOfRange {
                id,
                answer: self.answer,
            });
        }

        Ok(Question {
            id,
            prompt,
            choices,
            answer: self.answer,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with exactly four choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: [String; CHOICE_COUNT],
    answer: usize,
}

impl Question {
    /// Build a question from its parts.
    ///
    /// # Errors
    ///
    /// Same conditions as [`QuestionRecord::validate`].
    pub fn new(
        id: u32,
        prompt: impl Into<String>,
        choices: [&str; CHOICE_COUNT],
        answer: usize,
    ) -> Result<Self, QuestionError> {
        QuestionRecord {
            id,
            q: prompt.into(),
            choices: choices.iter().map(|c| (*c).to_string()).collect(),
            answer,
        }
        .validate()
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String; CHOICE_COUNT] {
        &self.choices
    }

    /// Index of the correct choice.
    #[must_use]
    pub fn answer(&self) -> usize {
        self.answer
    }

    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_well_formed_question() {
        let q = Question::new(1, "2 + 2 = ?", ["3", "4", "5", "6"], 1).unwrap();
        assert_eq!(q.id(), QuestionId::new(1));
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));
        assert_eq!(q.choices()[1], "4");
    }

    #[test]
    fn rejects_wrong_choice_count() {
        let err = QuestionRecord {
            id: 7,
            q: "Pick one".into(),
            choices: vec!["a".into(), "b".into()],
            answer: 0,
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err,
            QuestionError::ChoiceCount {
                id: QuestionId::new(7),
                len: 2
            }
        );
    }

    #[test]
    fn rejects_answer_out_of_range() {
        let err = Question::new(2, "Q", ["a", "b", "c", "d"], 4).unwrap_err();
        assert!(matches!(err, QuestionError::AnswerOutOfRange { answer: 4, .. }));
    }

    #[test]
    fn rejects_blank_prompt_and_choice() {
        assert!(matches!(
            Question::new(3, "   ", ["a", "b", "c", "d"], 0),
            Err(QuestionError::EmptyPrompt { .. })
        ));
        assert!(matches!(
            Question::new(3, "Q", ["a", " ", "c", "d"], 0),
            Err(QuestionError::EmptyChoice { index: 1, .. })
        ));
    }

    #[test]
    fn record_uses_bank_field_names() {
        let json = r#"{"id":1,"q":"H2O is?","choices":["O","Water","H","He"],"answer":1}"#;
        let record: QuestionRecord = serde_json::from_str(json).unwrap();
        let q = record.validate().unwrap();
        assert_eq!(q.prompt(), "H2O is?");
        assert_eq!(q.choices()[q.answer()], "Water");
    }
}
