//! Grading domain
//!
//! Binary classification contracts used to filter evidence and to validate
//! generated answers. Verdicts are strictly categorical; there are no scores
//! or thresholds, so branching on them is deterministic.

mod candidate;
mod grader;
mod verdict;

pub use candidate::Candidate;
pub use grader::{filter_relevant, AnswerGrader, GroundingGrader, RelevanceGrader, RelevanceSummary};
pub use verdict::{parse_binary_score, AnswerVerdict, GroundingVerdict, RelevanceVerdict};

#[cfg(test)]
pub use grader::mock::{MockAnswerGrader, MockGroundingGrader, MockRelevanceGrader};
