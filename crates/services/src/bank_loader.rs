use std::collections::BTreeMap;
use std::path::Path;

use quiz_core::model::{QuestionBank, QuestionRecord};

use crate::error::BankLoadError;

/// Parse a question bank document of the form
/// `{ "<category>": [{ "id", "q", "choices", "answer" }, ...], ... }`.
///
/// JSON objects carry no order, so categories come out sorted by name.
///
/// # Errors
///
/// Returns `BankLoadError::Parse` for malformed JSON and
/// `BankLoadError::Invalid` when a category or question fails validation.
pub fn parse_bank_json(raw: &str) -> Result<QuestionBank, BankLoadError> {
    let document: BTreeMap<String, Vec<QuestionRecord>> = serde_json::from_str(raw)?;
    Ok(QuestionBank::from_records(document)?)
}

/// Read and parse a question bank file.
///
/// # Errors
///
/// Returns `BankLoadError::Io` if the file cannot be read, otherwise the
/// errors of [`parse_bank_json`].
pub async fn load_bank_file(path: impl AsRef<Path>) -> Result<QuestionBank, BankLoadError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    let bank = parse_bank_json(&raw)?;
    log::info!(
        "loaded {} categories from {}",
        bank.categories().len(),
        path.display()
    );
    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::BankError;

    const SAMPLE: &str = r#"{
        "Geography": [
            { "id": 1, "q": "Capital of France?", "choices": ["Paris", "Rome", "Oslo", "Bern"], "answer": 0 },
            { "id": 2, "q": "Largest ocean?", "choices": ["Atlantic", "Indian", "Pacific", "Arctic"], "answer": 2 }
        ],
        "Art": [
            { "id": 1, "q": "Who painted the Mona Lisa?", "choices": ["Monet", "Da Vinci", "Goya", "Dali"], "answer": 1 }
        ]
    }"#;

    #[test]
    fn parses_categories_in_name_order() {
        let bank = parse_bank_json(SAMPLE).unwrap();
        let names: Vec<_> = bank.category_names().collect();
        assert_eq!(names, ["Art", "Geography"]);

        let geo = bank.category("Geography").unwrap();
        assert_eq!(geo.pool_size(), 2);
        assert_eq!(geo.questions()[1].answer(), 2);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            parse_bank_json("{\"Art\": [").unwrap_err(),
            BankLoadError::Parse(_)
        ));
    }

    #[test]
    fn invalid_question_is_rejected() {
        let raw = r#"{ "Art": [{ "id": 1, "q": "?", "choices": ["a", "b", "c"], "answer": 0 }] }"#;
        assert!(matches!(
            parse_bank_json(raw).unwrap_err(),
            BankLoadError::Invalid(BankError::Category(_))
        ));
    }

    #[test]
    fn empty_document_is_rejected() {
        assert!(matches!(
            parse_bank_json("{}").unwrap_err(),
            BankLoadError::Invalid(BankError::Empty)
        ));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("quiz-bank-does-not-exist.json");
        assert!(matches!(
            load_bank_file(&path).await.unwrap_err(),
            BankLoadError::Io(_)
        ));
    }

    #[tokio::test]
    async fn loads_bank_from_disk() {
        let path = std::env::temp_dir().join(format!("quiz-bank-{}.json", std::process::id()));
        tokio::fs::write(&path, SAMPLE).await.unwrap();
        let bank = load_bank_file(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(bank.categories().len(), 2);
    }
}
