//! Engine states and per-run state

use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::AttemptRecord;
use crate::domain::evidence::{FilteredEvidenceSet, RouteDecision};
use crate::domain::grading::{Candidate, RelevanceSummary};
use crate::domain::{DomainError, Question};

/// Nodes of the engine's control-flow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Route,
    Retrieve,
    GradeDocs,
    Generate,
    GradeGrounding,
    GradeAnswer,
    RewriteAndRetry,
    Done,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Retrieve => "retrieve",
            Self::GradeDocs => "grade_docs",
            Self::Generate => "generate",
            Self::GradeGrounding => "grade_grounding",
            Self::GradeAnswer => "grade_answer",
            Self::RewriteAndRetry => "rewrite_and_retry",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable record threaded through one run
///
/// Owned by a single engine execution. The attempt counter starts at 1, only
/// moves forward and never passes `max_attempts`. The base route is set once;
/// the attempt route may fall back to live search within one attempt, at most
/// `max_reroutes` times per attempt.
#[derive(Debug, Clone)]
pub struct RunState {
    original: Question,
    question: Question,
    route: Option<RouteDecision>,
    attempt_route: Option<RouteDecision>,
    evidence: FilteredEvidenceSet,
    candidate: Option<Candidate>,
    attempt: u32,
    max_attempts: u32,
    reroutes: u32,
    attempt_reroutes: u32,
    answer: Option<String>,
    records: Vec<AttemptRecord>,
}

impl RunState {
    pub fn new(question: Question, max_attempts: u32) -> Self {
        let record = AttemptRecord::new(1, &question);
        Self {
            original: question.clone(),
            question,
            route: None,
            attempt_route: None,
            evidence: FilteredEvidenceSet::default(),
            candidate: None,
            attempt: 1,
            max_attempts: max_attempts.max(1),
            reroutes: 0,
            attempt_reroutes: 0,
            answer: None,
            records: vec![record],
        }
    }

    pub fn original_question(&self) -> &Question {
        &self.original
    }

    /// The question of the current attempt
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// The route chosen for the run
    pub fn route(&self) -> Option<RouteDecision> {
        self.route
    }

    /// The route in effect for the current attempt
    pub fn attempt_route(&self) -> Option<RouteDecision> {
        self.attempt_route
    }

    pub fn evidence(&self) -> &FilteredEvidenceSet {
        &self.evidence
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Reroutes over the whole run
    pub fn reroutes(&self) -> u32 {
        self.reroutes
    }

    /// Reroutes spent by the current attempt
    pub fn attempt_reroutes(&self) -> u32 {
        self.attempt_reroutes
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    /// Set the run's route; a second call is rejected
    pub fn set_route(&mut self, route: RouteDecision) -> Result<(), DomainError> {
        if self.route.is_some() {
            return Err(DomainError::internal("Route already decided for this run"));
        }

        self.route = Some(route);
        self.attempt_route = Some(route);
        self.current_record().route = Some(route);
        Ok(())
    }

    /// Replace the run's route after a rewrite, when the policy allows it
    pub fn replace_route(&mut self, route: RouteDecision) {
        self.route = Some(route);
        self.attempt_route = Some(route);
        self.current_record().route = Some(route);
    }

    /// Switch the current attempt to live search
    ///
    /// Returns false when the attempt is not on the indexed store or this
    /// attempt's reroute budget is spent.
    pub fn reroute_attempt(&mut self, max_reroutes: u32) -> bool {
        if self.attempt_route != Some(RouteDecision::Vectorstore) || self.attempt_reroutes >= max_reroutes {
            return false;
        }

        self.reroutes += 1;
        self.attempt_reroutes += 1;
        self.attempt_route = Some(RouteDecision::WebSearch);

        let record = self.current_record();
        record.rerouted = true;
        record.route = Some(RouteDecision::WebSearch);
        true
    }

    /// Store this attempt's filtered evidence, replacing the previous one
    pub fn set_evidence(&mut self, evidence: FilteredEvidenceSet) {
        let summary = RelevanceSummary::of(&evidence);
        let record = self.current_record();
        record.retrieved = summary.retrieved;
        record.relevant = summary.relevant;
        self.evidence = evidence;
    }

    pub fn set_candidate(&mut self, candidate: Candidate) {
        self.current_record().answer_words = Some(candidate.word_count());
        self.candidate = Some(candidate);
    }

    pub fn current_record(&mut self) -> &mut AttemptRecord {
        let index = self.records.len() - 1;
        &mut self.records[index]
    }

    /// Whether another attempt fits within the budget
    pub fn has_attempts_left(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Start the next attempt with a rewritten question
    ///
    /// The attempt route goes back to the run's route, the reroute budget is
    /// restored and the previous attempt's evidence is dropped. Fails when the
    /// attempt budget is spent.
    pub fn begin_retry(&mut self, question: Question) -> Result<(), DomainError> {
        if !self.has_attempts_left() {
            return Err(DomainError::internal("Attempt budget exhausted"));
        }

        self.attempt += 1;
        self.question = question;
        self.attempt_route = self.route;
        self.attempt_reroutes = 0;
        self.evidence = FilteredEvidenceSet::default();

        let mut record = AttemptRecord::new(self.attempt, &self.question);
        record.route = self.route;
        self.records.push(record);
        Ok(())
    }

    /// Accept the current candidate as the final answer
    pub fn finalize(&mut self) -> Option<&str> {
        self.answer = self.candidate.as_ref().map(|c| c.answer.clone());
        self.answer.as_deref()
    }

    pub fn into_parts(self) -> RunParts {
        RunParts {
            original: self.original,
            route: self.route,
            attempt: self.attempt,
            reroutes: self.reroutes,
            answer: self.answer,
            last_candidate: self.candidate.map(|c| c.answer),
            records: self.records,
        }
    }
}

/// What is left of a [`RunState`] once the run has ended
#[derive(Debug, Clone)]
pub struct RunParts {
    pub original: Question,
    pub route: Option<RouteDecision>,
    pub attempt: u32,
    pub reroutes: u32,
    pub answer: Option<String>,
    pub last_candidate: Option<String>,
    pub records: Vec<AttemptRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evidence::Passage;

    fn question(text: &str) -> Question {
        Question::new(text).unwrap()
    }

    #[test]
    fn test_route_set_once() {
        let mut state = RunState::new(question("q"), 3);

        assert!(state.set_route(RouteDecision::Vectorstore).is_ok());
        assert!(state.set_route(RouteDecision::WebSearch).is_err());
        assert_eq!(state.route(), Some(RouteDecision::Vectorstore));
    }

    #[test]
    fn test_reroute_is_attempt_scoped() {
        let mut state = RunState::new(question("q"), 3);
        state.set_route(RouteDecision::Vectorstore).unwrap();

        assert!(state.reroute_attempt(1));
        assert_eq!(state.attempt_route(), Some(RouteDecision::WebSearch));
        assert_eq!(state.route(), Some(RouteDecision::Vectorstore));
        assert!(!state.reroute_attempt(1));

        state.begin_retry(question("q2")).unwrap();

        assert_eq!(state.attempt_route(), Some(RouteDecision::Vectorstore));
        assert_eq!(state.attempt_reroutes(), 0);
        assert!(state.reroute_attempt(1));
        assert!(!state.reroute_attempt(1));
        assert_eq!(state.attempt_reroutes(), 1);
        assert_eq!(state.reroutes(), 2);
        assert!(state.records()[1].rerouted);
    }

    #[test]
    fn test_attempts_bounded() {
        let mut state = RunState::new(question("q"), 2);

        assert_eq!(state.attempt(), 1);
        assert!(state.begin_retry(question("q2")).is_ok());
        assert!(!state.has_attempts_left());
        assert!(state.begin_retry(question("q3")).is_err());
        assert_eq!(state.attempt(), 2);
        assert_eq!(state.records().len(), 2);
        assert_eq!(state.question().as_str(), "q2");
        assert_eq!(state.original_question().as_str(), "q");
    }

    #[test]
    fn test_evidence_cleared_between_attempts() {
        let mut state = RunState::new(question("q"), 3);
        state.set_route(RouteDecision::Vectorstore).unwrap();
        state.set_evidence(FilteredEvidenceSet::new(vec![Passage::new("a", "x")], 2));

        assert_eq!(state.records()[0].relevant, 1);
        assert_eq!(state.records()[0].retrieved, 2);

        state.begin_retry(question("q2")).unwrap();
        assert!(state.evidence().is_empty());
    }

    #[test]
    fn test_finalize_takes_candidate_answer() {
        let mut state = RunState::new(question("q"), 1);
        assert_eq!(state.finalize(), None);

        state.set_candidate(Candidate::new(
            "final answer",
            question("q"),
            FilteredEvidenceSet::default(),
        ));

        assert_eq!(state.finalize(), Some("final answer"));
        let parts = state.into_parts();
        assert_eq!(parts.answer.as_deref(), Some("final answer"));
        assert_eq!(parts.records[0].answer_words, Some(2));
    }
}
