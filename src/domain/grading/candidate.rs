//! Candidate answers

use serde::{Deserialize, Serialize};

use crate::domain::evidence::FilteredEvidenceSet;
use crate::domain::Question;

/// A generated answer, tagged with the question it answers and the evidence
/// it was produced from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub answer: String,
    pub question: Question,
    pub evidence: FilteredEvidenceSet,
}

impl Candidate {
    pub fn new(
        answer: impl Into<String>,
        question: Question,
        evidence: FilteredEvidenceSet,
    ) -> Self {
        Self {
            answer: answer.into(),
            question,
            evidence,
        }
    }

    /// Answer length in whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.answer.split_whitespace().count()
    }
}
