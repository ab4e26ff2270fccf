//! Grader capabilities and relevance filtering

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::candidate::Candidate;
use super::verdict::{AnswerVerdict, GroundingVerdict, RelevanceVerdict};
use crate::domain::evidence::{EvidenceSet, FilteredEvidenceSet, Passage};
use crate::domain::{DomainError, Question};

/// Classifies a single passage as usable or not for a question
///
/// Calls are independent per passage and may run concurrently.
#[async_trait]
pub trait RelevanceGrader: Send + Sync + Debug {
    async fn grade_relevance(
        &self,
        question: &Question,
        passage: &Passage,
    ) -> Result<RelevanceVerdict, DomainError>;

    fn grader_name(&self) -> &'static str;
}

/// Hallucination check: are the candidate's claims traceable to the evidence
/// it was generated from
#[async_trait]
pub trait GroundingGrader: Send + Sync + Debug {
    async fn grade_grounding(&self, candidate: &Candidate)
        -> Result<GroundingVerdict, DomainError>;

    fn grader_name(&self) -> &'static str;
}

/// Does the candidate actually address the question
#[async_trait]
pub trait AnswerGrader: Send + Sync + Debug {
    async fn grade_answer(
        &self,
        question: &Question,
        candidate: &Candidate,
    ) -> Result<AnswerVerdict, DomainError>;

    fn grader_name(&self) -> &'static str;
}

/// Keep the passages graded relevant, preserving input order
///
/// `verdicts[i]` must be the verdict for `evidence.passages()[i]`.
pub fn filter_relevant(
    evidence: &EvidenceSet,
    verdicts: &[RelevanceVerdict],
) -> Result<FilteredEvidenceSet, DomainError> {
    if verdicts.len() != evidence.len() {
        return Err(DomainError::internal(format!(
            "Got {} relevance verdicts for {} passages",
            verdicts.len(),
            evidence.len()
        )));
    }

    let passages = evidence
        .passages()
        .iter()
        .zip(verdicts)
        .filter(|(_, verdict)| verdict.is_relevant())
        .map(|(passage, _)| passage.clone())
        .collect();

    Ok(FilteredEvidenceSet::new(passages, evidence.len()))
}

/// Counts from one relevance grading pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceSummary {
    pub retrieved: usize,
    pub relevant: usize,
}

impl RelevanceSummary {
    pub fn of(filtered: &FilteredEvidenceSet) -> Self {
        Self {
            retrieved: filtered.retrieved(),
            relevant: filtered.len(),
        }
    }

    pub fn irrelevant(&self) -> usize {
        self.retrieved - self.relevant
    }

    pub fn relevant_percentage(&self) -> f32 {
        if self.retrieved == 0 {
            0.0
        } else {
            (self.relevant as f32 / self.retrieved as f32) * 100.0
        }
    }
}
