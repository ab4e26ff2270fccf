//! Run outcomes and results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::EngineError;
use super::state::{EngineState, RunParts};
use crate::domain::evidence::RouteDecision;
use crate::domain::grading::{AnswerVerdict, GroundingVerdict};
use crate::domain::Question;

/// Terminal outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Done,
    FailedToConverge,
    Cancelled,
    FatalError,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "DONE",
            Self::FailedToConverge => "FAILED_TO_CONVERGE",
            Self::Cancelled => "CANCELLED",
            Self::FatalError => "FATAL_ERROR",
        }
    }

    pub fn all() -> [RunOutcome; 4] {
        [
            Self::Done,
            Self::FailedToConverge,
            Self::Cancelled,
            Self::FatalError,
        ]
    }
}

/// Why an attempt failed, and why a run stopped converging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionReason {
    /// The candidate was not supported by its evidence
    Ungrounded,
    /// The candidate did not address the question
    OffTopic,
    /// No relevant evidence could be found
    NoEvidence,
    /// The generator failed
    GenerationFailed,
}

/// What happened during one attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub question: String,
    pub route: Option<RouteDecision>,
    pub rerouted: bool,
    pub retrieved: usize,
    pub relevant: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding: Option<GroundingVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_words: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExhaustionReason>,
}

impl AttemptRecord {
    pub fn new(attempt: u32, question: &Question) -> Self {
        Self {
            attempt,
            question: question.as_str().to_string(),
            route: None,
            rerouted: false,
            retrieved: 0,
            relevant: 0,
            grounding: None,
            answer: None,
            answer_words: None,
            failure: None,
        }
    }
}

/// Structured reason attached to every run result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhaustion: Option<ExhaustionReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineError>,
    /// Last candidate produced, kept as a best-effort answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_candidate: Option<String>,
    pub attempts: Vec<AttemptRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<EngineState>,
}

/// Result of one engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    /// The question as asked, before any rewrite
    pub question: String,
    pub final_answer: Option<String>,
    pub outcome: RunOutcome,
    /// None only when the run ended before a route was chosen
    pub route_taken: Option<RouteDecision>,
    pub attempts: u32,
    pub reroutes: u32,
    pub diagnostics: Diagnostics,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RunResult {
    /// Assemble a result from an ended run
    ///
    /// `final_answer` is only populated for `Done`; the last candidate of any
    /// other outcome goes to `diagnostics.best_candidate`.
    pub fn from_parts(
        run_id: impl Into<String>,
        parts: RunParts,
        outcome: RunOutcome,
        mut diagnostics: Diagnostics,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        let final_answer = match outcome {
            RunOutcome::Done => parts.answer,
            _ => None,
        };

        if outcome != RunOutcome::Done && outcome != RunOutcome::Cancelled {
            diagnostics.best_candidate = parts.last_candidate;
        }
        diagnostics.attempts = parts.records;

        Self {
            run_id: run_id.into(),
            question: parts.original.into(),
            final_answer,
            outcome,
            route_taken: parts.route,
            attempts: parts.attempt,
            reroutes: parts.reroutes,
            diagnostics,
            started_at,
            duration_ms,
        }
    }

    /// Result for a question rejected before the run started
    pub fn rejected(run_id: impl Into<String>, question: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            question: question.into(),
            final_answer: None,
            outcome: RunOutcome::FatalError,
            route_taken: None,
            attempts: 0,
            reroutes: 0,
            diagnostics: Diagnostics {
                error: Some(EngineError::InvalidQuestion {
                    message: message.into(),
                }),
                ..Default::default()
            },
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.outcome == RunOutcome::Done
    }

    /// Relevant passages behind the last attempt
    pub fn documents_used(&self) -> usize {
        self.diagnostics
            .attempts
            .last()
            .map(|r| r.relevant)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::state::RunState;
    use crate::domain::evidence::FilteredEvidenceSet;
    use crate::domain::grading::Candidate;

    fn state_with_candidate() -> RunState {
        let question = Question::new("What is a nebula?").unwrap();
        let mut state = RunState::new(question.clone(), 3);
        state.set_route(RouteDecision::Vectorstore).unwrap();
        state.set_candidate(Candidate::new(
            "A cloud of gas and dust.",
            question,
            FilteredEvidenceSet::default(),
        ));
        state
    }

    #[test]
    fn test_done_result_carries_answer() {
        let mut state = state_with_candidate();
        state.finalize();

        let result = RunResult::from_parts(
            "run-1",
            state.into_parts(),
            RunOutcome::Done,
            Diagnostics::default(),
            Utc::now(),
            12,
        );

        assert!(result.is_done());
        assert_eq!(result.final_answer.as_deref(), Some("A cloud of gas and dust."));
        assert_eq!(result.route_taken, Some(RouteDecision::Vectorstore));
        assert_eq!(result.attempts, 1);
        assert!(result.diagnostics.best_candidate.is_none());
    }

    #[test]
    fn test_failed_result_keeps_best_candidate() {
        let result = RunResult::from_parts(
            "run-2",
            state_with_candidate().into_parts(),
            RunOutcome::FailedToConverge,
            Diagnostics {
                exhaustion: Some(ExhaustionReason::Ungrounded),
                ..Default::default()
            },
            Utc::now(),
            40,
        );

        assert!(result.final_answer.is_none());
        assert_eq!(
            result.diagnostics.best_candidate.as_deref(),
            Some("A cloud of gas and dust.")
        );
        assert_eq!(result.diagnostics.attempts.len(), 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&RunOutcome::FailedToConverge).unwrap();
        assert_eq!(json, r#""FAILED_TO_CONVERGE""#);
        assert_eq!(RunOutcome::Cancelled.as_str(), "CANCELLED");
    }

    #[test]
    fn test_rejected_result() {
        let result = RunResult::rejected("run-3", "  ", "Question must not be empty");

        assert_eq!(result.outcome, RunOutcome::FatalError);
        assert_eq!(
            result.diagnostics.error.as_ref().map(|e| e.code()),
            Some("INVALID_QUESTION")
        );
    }
}
