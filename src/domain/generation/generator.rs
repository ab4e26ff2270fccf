//! Answer generator capability

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::evidence::FilteredEvidenceSet;
use crate::domain::{DomainError, Question};

/// Produces a candidate answer from a question and its relevant evidence
///
/// Output is not assumed deterministic; each attempt re-samples.
#[async_trait]
pub trait Generator: Send + Sync + Debug {
    async fn generate(
        &self,
        question: &Question,
        evidence: &FilteredEvidenceSet,
    ) -> Result<String, DomainError>;

    fn generator_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Mock generator returning scripted answers in order
    #[derive(Debug)]
    pub struct MockGenerator {
        answers: Mutex<Vec<Result<String, DomainError>>>,
        evidence_sizes: Mutex<Vec<usize>>,
    }

    impl MockGenerator {
        pub fn new() -> Self {
            Self {
                answers: Mutex::new(Vec::new()),
                evidence_sizes: Mutex::new(Vec::new()),
            }
        }

        pub fn answering(answer: impl Into<String>) -> Self {
            Self::new().then(answer)
        }

        pub fn then(self, answer: impl Into<String>) -> Self {
            self.answers.lock().unwrap().push(Ok(answer.into()));
            self
        }

        pub fn then_error(self, error: DomainError) -> Self {
            self.answers.lock().unwrap().push(Err(error));
            self
        }

        /// Evidence size seen by each call
        pub fn evidence_sizes(&self) -> Vec<usize> {
            self.evidence_sizes.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.evidence_sizes.lock().unwrap().len()
        }
    }

    impl Default for MockGenerator {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Generator for MockGenerator {
        async fn generate(
            &self,
            question: &Question,
            evidence: &FilteredEvidenceSet,
        ) -> Result<String, DomainError> {
            self.evidence_sizes.lock().unwrap().push(evidence.len());

            let mut answers = self.answers.lock().unwrap();
            match answers.len() {
                0 => Ok(format!("Answer to: {}", question)),
                1 => answers[0].clone(),
                _ => answers.remove(0),
            }
        }

        fn generator_name(&self) -> &'static str {
            "mock"
        }
    }
}
