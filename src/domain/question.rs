//! Question value type

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// An immutable, non-empty question text
///
/// A rewrite produces a new `Question`; existing values are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Question(String);

impl Question {
    /// Create a question, rejecting empty or whitespace-only text
    pub fn new(text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Err(DomainError::validation("Question must not be empty"));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Question {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Question> for String {
    fn from(question: Question) -> Self {
        question.0
    }
}

impl AsRef<str> for Question {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_trims_text() {
        let question = Question::new("  How does interlibrary loan work?  ").unwrap();
        assert_eq!(question.as_str(), "How does interlibrary loan work?");
    }

    #[test]
    fn test_question_rejects_blank() {
        assert!(Question::new("").is_err());
        assert!(Question::new("   \n\t").is_err());
    }

    #[test]
    fn test_question_deserialization_validates() {
        let ok: Question = serde_json::from_str(r#""What is RAG?""#).unwrap();
        assert_eq!(ok.to_string(), "What is RAG?");

        let err = serde_json::from_str::<Question>(r#""  ""#);
        assert!(err.is_err());
    }
}
