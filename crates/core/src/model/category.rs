use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{Question, QuestionError, QuestionRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,

    #[error("category {category:?} repeats question id {id}")]
    DuplicateQuestionId { category: String, id: QuestionId },

    #[error("category {category:?}: {source}")]
    Question {
        category: String,
        #[source]
        source: QuestionError,
    },
}

/// A named, ordered pool of questions.
///
/// The pool may be empty; starting a session on an empty pool is rejected
/// by the session layer, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    questions: Vec<Question>,
}

impl Category {
    /// # Errors
    ///
    /// Returns `CategoryError::EmptyName` for a blank name and
    /// `CategoryError::DuplicateQuestionId` when two questions share an id.
    pub fn new(name: impl Into<String>, questions: Vec<Question>) -> Result<Self, CategoryError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CategoryError::EmptyName);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(CategoryError::DuplicateQuestionId {
                    category: name,
                    id: question.id(),
                });
            }
        }

        Ok(Self { name, questions })
    }

    /// Validate serialized question records into a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Question` wrapping the first invalid record,
    /// or any error of [`Category::new`].
    pub fn from_records(
        name: impl Into<String>,
        records: Vec<QuestionRecord>,
    ) -> Result<Self, CategoryError> {
        let name = name.into();
        let questions = records
            .into_iter()
            .map(QuestionRecord::validate)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| CategoryError::Question {
                category: name.clone(),
                source,
            })?;
        Self::new(name, questions)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions in the pool.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: u32) -> Question {
        Question::new(id, format!("Q{id}"), ["a", "b", "c", "d"], 0).unwrap()
    }

    #[test]
    fn trims_name_and_keeps_order() {
        let cat = Category::new("  Math ", vec![q(3), q(1), q(2)]).unwrap();
        assert_eq!(cat.name(), "Math");
        let ids: Vec<u32> = cat.questions().iter().map(|q| q.id().value()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Category::new("Math", vec![q(1), q(1)]).unwrap_err();
        assert!(matches!(err, CategoryError::DuplicateQuestionId { .. }));
    }

    #[test]
    fn rejects_empty_name_but_allows_empty_pool() {
        assert_eq!(Category::new(" ", vec![]).unwrap_err(), CategoryError::EmptyName);
        let empty = Category::new("Empty", vec![]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.pool_size(), 0);
    }

    #[test]
    fn from_records_reports_category_of_bad_question() {
        let records = vec![QuestionRecord {
            id: 1,
            q: "Q".into(),
            choices: vec!["a".into()],
            answer: 0,
        }];
        let err = Category::from_records("Science", records).unwrap_err();
        match err {
            CategoryError::Question { category, .. } => assert_eq!(category, "Science"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
