use std::collections::HashSet;

use thiserror::Error;

use crate::model::category::{Category, CategoryError};
use crate::model::question::QuestionRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank has no categories")]
    Empty,

    #[error("category {0:?} appears more than once")]
    DuplicateCategory(String),

    #[error(transparent)]
    Category(#[from] CategoryError),
}

/// Read-only catalog of categories, kept in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    categories: Vec<Category>,
}

impl QuestionBank {
    /// # Errors
    ///
    /// Returns `BankError::Empty` if there are no categories and
    /// `BankError::DuplicateCategory` if two share a name.
    pub fn new(categories: Vec<Category>) -> Result<Self, BankError> {
        if categories.is_empty() {
            return Err(BankError::Empty);
        }
        let mut seen = HashSet::with_capacity(categories.len());
        for category in &categories {
            if !seen.insert(category.name()) {
                return Err(BankError::DuplicateCategory(category.name().to_string()));
            }
        }
        Ok(Self { categories })
    }

    /// Build a bank from `(category name, records)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if any category or question fails validation.
    pub fn from_records<I, S>(entries: I) -> Result<Self, BankError>
    where
        I: IntoIterator<Item = (S, Vec<QuestionRecord>)>,
        S: Into<String>,
    {
        let categories = entries
            .into_iter()
            .map(|(name, records)| Category::from_records(name, records))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(categories)
    }

    /// The bank that ships with the application.
    ///
    /// # Panics
    ///
    /// Panics if the embedded questions fail validation, which the unit tests
    /// rule out.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_records(builtin_records()).expect("built-in bank should be valid")
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(Category::name)
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name() == name)
    }
}

fn rec(id: u32, q: &str, choices: [&str; 4], answer: usize) -> QuestionRecord {
    QuestionRecord {
        id,
        q: q.to_string(),
        choices: choices.iter().map(|c| (*c).to_string()).collect(),
        answer,
    }
}

fn builtin_records() -> Vec<(&'static str, Vec<QuestionRecord>)> {
    vec![
        (
            "Math",
            vec![
                rec(1, "2 + 2 = ?", ["3", "4", "5", "6"], 1),
                rec(2, "5 × 6 = ?", ["11", "30", "35", "56"], 1),
                rec(3, "√81 = ?", ["7", "8", "9", "10"], 2),
                rec(4, "10% of 200 = ?", ["10", "20", "30", "40"], 1),
                rec(5, "LCM of 3 and 4 = ?", ["7", "12", "6", "9"], 1),
            ],
        ),
        (
            "English",
            vec![
                rec(
                    1,
                    "Choose the correct plural: \"One mouse, two ___\"",
                    ["mouses", "mice", "mouse", "meese"],
                    1,
                ),
                rec(
                    2,
                    "Pick the synonym of \"happy\"",
                    ["sad", "angry", "joyful", "thin"],
                    2,
                ),
                rec(3, "Which is a verb?", ["quick", "run", "blue", "cat"], 1),
                rec(
                    4,
                    "Fill: \"I ___ to school yesterday.\"",
                    ["go", "gone", "went", "going"],
                    2,
                ),
                rec(5, "Opposite of \"cold\"", ["hot", "small", "tall", "far"], 0),
            ],
        ),
        (
            "General",
            vec![
                rec(
                    1,
                    "Earth is the ___ planet from the Sun.",
                    ["first", "second", "third", "fourth"],
                    2,
                ),
                rec(
                    2,
                    "Water boils at ___ °C (at sea level).",
                    ["50", "75", "100", "120"],
                    2,
                ),
                rec(
                    3,
                    "HTML stands for?",
                    [
                        "Hyperlinks and Text Markup Language",
                        "Home Tool Markup Language",
                        "HyperText Markup Language",
                        "HyperTabular Markup Language",
                    ],
                    2,
                ),
                rec(
                    4,
                    "Which animal is known as the King of the Jungle?",
                    ["Tiger", "Elephant", "Lion", "Giraffe"],
                    2,
                ),
                rec(
                    5,
                    "The largest ocean is the ___ Ocean.",
                    ["Atlantic", "Indian", "Pacific", "Arctic"],
                    2,
                ),
            ],
        ),
        (
            "Science",
            vec![
                rec(
                    1,
                    "H2O is commonly known as?",
                    ["Oxygen", "Water", "Hydrogen", "Helium"],
                    1,
                ),
                rec(
                    2,
                    "The process of plants making food is called?",
                    ["Respiration", "Photosynthesis", "Transpiration", "Osmosis"],
                    1,
                ),
            ],
        ),
        (
            "History",
            vec![
                rec(
                    1,
                    "Who was the first President of the USA?",
                    [
                        "Abraham Lincoln",
                        "George Washington",
                        "Thomas Jefferson",
                        "John Adams",
                    ],
                    1,
                ),
                rec(
                    2,
                    "World War II ended in which year?",
                    ["1945", "1939", "1918", "1963"],
                    0,
                ),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bank_has_expected_categories() {
        let bank = QuestionBank::builtin();
        let names: Vec<&str> = bank.category_names().collect();
        assert_eq!(names, vec!["Math", "English", "General", "Science", "History"]);
        assert_eq!(bank.category("Math").unwrap().pool_size(), 5);
        assert_eq!(bank.category("Science").unwrap().pool_size(), 2);
    }

    #[test]
    fn unknown_category_is_none() {
        assert!(QuestionBank::builtin().category("Geography").is_none());
    }

    #[test]
    fn rejects_duplicate_and_empty_banks() {
        assert_eq!(QuestionBank::new(vec![]).unwrap_err(), BankError::Empty);

        let a = Category::new("Math", vec![]).unwrap();
        let err = QuestionBank::new(vec![a.clone(), a]).unwrap_err();
        assert_eq!(err, BankError::DuplicateCategory("Math".into()));
    }
}
