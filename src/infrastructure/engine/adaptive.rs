//! Adaptive RAG engine
//!
//! Explicit state machine over the route, retrieve, grade, generate and
//! rewrite stages. Every external call runs under the configured deadline,
//! cancellation is checked before each stage, and the attempt budget is held
//! by [`RunState`].

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::engine::{
    AdaptiveEngine, Diagnostics, EngineConfig, EngineError, EngineState, ExhaustionReason,
    RewritePolicy, RunOutcome, RunResult, RunState,
};
use crate::domain::evidence::{EvidenceSet, EvidenceSources, RetrievalRequest, RouteDecision};
use crate::domain::generation::{Generator, QueryRewriter};
use crate::domain::grading::{
    filter_relevant, AnswerGrader, Candidate, GroundingGrader, RelevanceGrader,
};
use crate::domain::routing::{QueryRouter, TopicRegistry, TopicSnapshot};
use crate::domain::{DomainError, Question};
use crate::infrastructure::observability::{record_run, record_stage_call};

/// How a run ended, before it is folded into a [`RunResult`]
#[derive(Debug)]
struct Terminal {
    outcome: RunOutcome,
    exhaustion: Option<ExhaustionReason>,
    error: Option<EngineError>,
    cancelled_at: Option<EngineState>,
}

impl Terminal {
    fn done() -> Self {
        Self {
            outcome: RunOutcome::Done,
            exhaustion: None,
            error: None,
            cancelled_at: None,
        }
    }

    fn cancelled(at: EngineState) -> Self {
        Self {
            outcome: RunOutcome::Cancelled,
            exhaustion: None,
            error: None,
            cancelled_at: Some(at),
        }
    }

    fn exhausted(reason: ExhaustionReason, last_error: Option<EngineError>) -> Self {
        Self {
            outcome: RunOutcome::FailedToConverge,
            exhaustion: Some(reason),
            error: last_error,
            cancelled_at: None,
        }
    }

    fn fatal(error: EngineError) -> Self {
        Self {
            outcome: RunOutcome::FatalError,
            exhaustion: None,
            error: Some(error),
            cancelled_at: None,
        }
    }
}

/// The adaptive engine over pluggable capabilities
#[derive(Debug, Clone)]
pub struct AdaptiveRagEngine {
    router: Arc<dyn QueryRouter>,
    sources: EvidenceSources,
    relevance: Arc<dyn RelevanceGrader>,
    generator: Arc<dyn Generator>,
    grounding: Arc<dyn GroundingGrader>,
    answer: Arc<dyn AnswerGrader>,
    rewriter: Arc<dyn QueryRewriter>,
    topics: Arc<TopicRegistry>,
    config: EngineConfig,
}

impl AdaptiveRagEngine {
    pub fn builder() -> AdaptiveRagEngineBuilder {
        AdaptiveRagEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn topics(&self) -> &Arc<TopicRegistry> {
        &self.topics
    }

    /// Await `call` under the per-call deadline
    async fn call<T, F>(&self, stage: EngineState, call: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        let timeout = self.config.call_timeout();
        let start = Instant::now();

        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::timeout(stage.as_str(), self.config.call_timeout_ms)),
        };

        record_stage_call(stage, result.is_ok(), start.elapsed());
        result
    }

    fn call_timeout(&self, stage: EngineState) -> EngineError {
        EngineError::CallTimeout {
            stage,
            timeout_ms: self.config.call_timeout_ms,
        }
    }

    async fn decide_route(
        &self,
        question: &Question,
        topics: &TopicSnapshot,
    ) -> Result<RouteDecision, EngineError> {
        self.call(EngineState::Route, self.router.route(question, topics))
            .await
            .map_err(|e| match e {
                DomainError::Timeout { .. } => self.call_timeout(EngineState::Route),
                other => EngineError::routing(other),
            })
    }

    /// Retrieve from `route`, retrying transient failures locally
    async fn retrieve(&self, route: RouteDecision, question: &Question) -> Result<EvidenceSet, EngineError> {
        let source = self.sources.for_route(route);
        let k = self.config.k_for(route);
        let policy = &self.config.source_retry;
        let mut retry = 0;

        loop {
            let request = RetrievalRequest::new(question.clone(), k, self.config.call_timeout());

            match self.call(EngineState::Retrieve, source.retrieve(request)).await {
                Ok(set) => return Ok(set.truncated(k)),
                Err(e) if retry < policy.max_retries => {
                    let delay = policy.delay_for_retry(retry);
                    warn!(
                        source = source.source_name(),
                        retry = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrieval failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(EngineError::retrieval(source.source_name(), e)),
            }
        }
    }

    /// Grade every passage concurrently; verdicts are recombined in input order
    async fn grade_documents(
        &self,
        question: &Question,
        evidence: &EvidenceSet,
    ) -> Result<crate::domain::evidence::FilteredEvidenceSet, EngineError> {
        let calls = evidence.passages().iter().map(|passage| {
            self.call(
                EngineState::GradeDocs,
                self.relevance.grade_relevance(question, passage),
            )
        });

        let verdicts = join_all(calls)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.grading_failure(EngineState::GradeDocs, self.relevance.grader_name(), e))?;

        filter_relevant(evidence, &verdicts)
            .map_err(|e| EngineError::grading(self.relevance.grader_name(), e))
    }

    fn grading_failure(&self, stage: EngineState, grader: &str, error: DomainError) -> EngineError {
        match error {
            DomainError::Timeout { .. } => self.call_timeout(stage),
            other => EngineError::grading(grader, other),
        }
    }

    /// Drive the state machine until a terminal
    async fn drive(
        &self,
        run_id: &str,
        state: &mut RunState,
        topics: &TopicSnapshot,
        cancel: &CancellationToken,
    ) -> Terminal {
        let mut stage = EngineState::Route;
        let mut retrieved = EvidenceSet::empty();
        let mut failure = ExhaustionReason::NoEvidence;
        let mut last_error: Option<EngineError> = None;

        loop {
            if stage != EngineState::Done && cancel.is_cancelled() {
                info!(run_id, stage = %stage, attempt = state.attempt(), "Run cancelled");
                return Terminal::cancelled(stage);
            }

            let next = match stage {
                EngineState::Route => match self.decide_route(state.question(), topics).await {
                    Ok(route) => {
                        if let Err(e) = state.set_route(route) {
                            return Terminal::fatal(EngineError::routing(e));
                        }
                        info!(run_id, route = %route, topics_version = topics.version, "Route decided");
                        EngineState::Retrieve
                    }
                    Err(e) => return Terminal::fatal(e),
                },

                EngineState::Retrieve => {
                    let Some(route) = state.attempt_route() else {
                        return Terminal::fatal(EngineError::routing(DomainError::internal(
                            "Retrieval before routing",
                        )));
                    };

                    match self.retrieve(route, state.question()).await {
                        Ok(set) => {
                            debug!(run_id, route = %route, passages = set.len(), "Retrieved evidence");
                            retrieved = set;
                            EngineState::GradeDocs
                        }
                        Err(e) if self.config.reroute_on_source_error
                            && state.reroute_attempt(self.config.max_reroutes) =>
                        {
                            warn!(run_id, error = %e, "Indexed store failed, falling back to live search");
                            last_error = Some(e);
                            EngineState::Retrieve
                        }
                        Err(e @ EngineError::RetrievalTimeout { .. })
                            if self.config.timeout_counts_as_retry =>
                        {
                            warn!(run_id, error = %e, "Retrieval timed out, counting as failed attempt");
                            failure = ExhaustionReason::NoEvidence;
                            state.current_record().failure = Some(failure);
                            last_error = Some(e);
                            EngineState::RewriteAndRetry
                        }
                        Err(e) => return Terminal::fatal(e),
                    }
                }

                EngineState::GradeDocs => {
                    let filtered = match self.grade_documents(state.question(), &retrieved).await {
                        Ok(filtered) => filtered,
                        Err(e) => return Terminal::fatal(e),
                    };

                    debug!(
                        run_id,
                        retrieved = filtered.retrieved(),
                        relevant = filtered.len(),
                        "Graded documents"
                    );

                    let empty = filtered.is_empty();
                    state.set_evidence(filtered);

                    if !empty {
                        EngineState::Generate
                    } else if state.reroute_attempt(self.config.max_reroutes) {
                        info!(run_id, attempt = state.attempt(), "No relevant documents, rerouting to live search");
                        EngineState::Retrieve
                    } else {
                        let Some(route) = state.attempt_route() else {
                            return Terminal::fatal(EngineError::routing(DomainError::internal(
                                "Graded evidence without a route",
                            )));
                        };
                        failure = ExhaustionReason::NoEvidence;
                        state.current_record().failure = Some(failure);
                        last_error = Some(EngineError::EmptyEvidence { route });
                        EngineState::RewriteAndRetry
                    }
                }

                EngineState::Generate => {
                    let generated = self
                        .call(
                            EngineState::Generate,
                            self.generator.generate(state.question(), state.evidence()),
                        )
                        .await;

                    match generated {
                        Ok(answer) => {
                            let candidate =
                                Candidate::new(answer, state.question().clone(), state.evidence().clone());
                            state.set_candidate(candidate);
                            EngineState::GradeGrounding
                        }
                        Err(e) if e.is_timeout() && !self.config.timeout_counts_as_retry => {
                            return Terminal::fatal(self.call_timeout(EngineState::Generate));
                        }
                        Err(e) => {
                            warn!(run_id, attempt = state.attempt(), error = %e, "Generation failed");
                            failure = ExhaustionReason::GenerationFailed;
                            state.current_record().failure = Some(failure);
                            last_error = Some(EngineError::generation(e));
                            EngineState::RewriteAndRetry
                        }
                    }
                }

                EngineState::GradeGrounding => {
                    let Some(candidate) = state.candidate() else {
                        return Terminal::fatal(EngineError::generation(DomainError::internal(
                            "Grounding check without a candidate",
                        )));
                    };

                    let verdict = match self
                        .call(EngineState::GradeGrounding, self.grounding.grade_grounding(candidate))
                        .await
                    {
                        Ok(verdict) => verdict,
                        Err(e) => {
                            return Terminal::fatal(self.grading_failure(
                                EngineState::GradeGrounding,
                                self.grounding.grader_name(),
                                e,
                            ))
                        }
                    };

                    state.current_record().grounding = Some(verdict);

                    if verdict.is_supported() {
                        EngineState::GradeAnswer
                    } else {
                        info!(run_id, attempt = state.attempt(), "Answer not grounded in evidence");
                        failure = ExhaustionReason::Ungrounded;
                        state.current_record().failure = Some(failure);
                        EngineState::RewriteAndRetry
                    }
                }

                EngineState::GradeAnswer => {
                    let Some(candidate) = state.candidate() else {
                        return Terminal::fatal(EngineError::generation(DomainError::internal(
                            "Answer check without a candidate",
                        )));
                    };

                    let verdict = match self
                        .call(
                            EngineState::GradeAnswer,
                            self.answer.grade_answer(state.original_question(), candidate),
                        )
                        .await
                    {
                        Ok(verdict) => verdict,
                        Err(e) => {
                            return Terminal::fatal(self.grading_failure(
                                EngineState::GradeAnswer,
                                self.answer.grader_name(),
                                e,
                            ))
                        }
                    };

                    state.current_record().answer = Some(verdict);

                    if verdict.is_useful() {
                        state.finalize();
                        EngineState::Done
                    } else {
                        info!(run_id, attempt = state.attempt(), "Answer does not address the question");
                        failure = ExhaustionReason::OffTopic;
                        state.current_record().failure = Some(failure);
                        EngineState::RewriteAndRetry
                    }
                }

                EngineState::RewriteAndRetry => {
                    if !state.has_attempts_left() {
                        info!(
                            run_id,
                            attempts = state.attempt(),
                            reason = ?failure,
                            "Attempt budget exhausted"
                        );
                        return Terminal::exhausted(failure, last_error);
                    }

                    let rewritten = match self
                        .call(EngineState::RewriteAndRetry, self.rewriter.rewrite(state.question()))
                        .await
                    {
                        Ok(question) => question,
                        Err(e) if e.is_timeout() => {
                            return Terminal::fatal(self.call_timeout(EngineState::RewriteAndRetry))
                        }
                        Err(e) => return Terminal::fatal(EngineError::rewrite(e)),
                    };

                    debug!(run_id, question = %rewritten, "Rewrote question");

                    if let Err(e) = state.begin_retry(rewritten) {
                        return Terminal::fatal(EngineError::rewrite(e));
                    }

                    if self.config.rewrite_policy == RewritePolicy::Reroute {
                        if cancel.is_cancelled() {
                            info!(run_id, stage = %EngineState::Route, attempt = state.attempt(), "Run cancelled");
                            return Terminal::cancelled(EngineState::Route);
                        }

                        match self.decide_route(state.question(), topics).await {
                            Ok(route) => state.replace_route(route),
                            Err(e) => return Terminal::fatal(e),
                        }
                    }

                    EngineState::Retrieve
                }

                EngineState::Done => return Terminal::done(),
            };

            info!(
                run_id,
                from = %stage,
                to = %next,
                attempt = state.attempt(),
                "Stage transition"
            );
            stage = next;
        }
    }
}

#[async_trait]
impl AdaptiveEngine for AdaptiveRagEngine {
    async fn run(&self, question: Question, cancel: CancellationToken) -> RunResult {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        let topics = self.topics.snapshot();

        info!(run_id = %run_id, question = %question, "Run started");

        let mut state = RunState::new(question, self.config.max_attempts);
        let terminal = self.drive(&run_id, &mut state, &topics, &cancel).await;

        let diagnostics = Diagnostics {
            exhaustion: terminal.exhaustion,
            error: terminal.error,
            cancelled_at: terminal.cancelled_at,
            ..Default::default()
        };

        let result = RunResult::from_parts(
            run_id,
            state.into_parts(),
            terminal.outcome,
            diagnostics,
            started_at,
            clock.elapsed().as_millis() as u64,
        );

        info!(
            run_id = %result.run_id,
            outcome = result.outcome.as_str(),
            attempts = result.attempts,
            reroutes = result.reroutes,
            duration_ms = result.duration_ms,
            "Run finished"
        );
        record_run(&result);

        result
    }
}

/// Builder for [`AdaptiveRagEngine`]
#[derive(Debug, Default)]
pub struct AdaptiveRagEngineBuilder {
    router: Option<Arc<dyn QueryRouter>>,
    sources: Option<EvidenceSources>,
    relevance: Option<Arc<dyn RelevanceGrader>>,
    generator: Option<Arc<dyn Generator>>,
    grounding: Option<Arc<dyn GroundingGrader>>,
    answer: Option<Arc<dyn AnswerGrader>>,
    rewriter: Option<Arc<dyn QueryRewriter>>,
    topics: Option<Arc<TopicRegistry>>,
    config: EngineConfig,
}

impl AdaptiveRagEngineBuilder {
    pub fn router(mut self, router: Arc<dyn QueryRouter>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn sources(mut self, sources: EvidenceSources) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn relevance_grader(mut self, grader: Arc<dyn RelevanceGrader>) -> Self {
        self.relevance = Some(grader);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn grounding_grader(mut self, grader: Arc<dyn GroundingGrader>) -> Self {
        self.grounding = Some(grader);
        self
    }

    pub fn answer_grader(mut self, grader: Arc<dyn AnswerGrader>) -> Self {
        self.answer = Some(grader);
        self
    }

    pub fn rewriter(mut self, rewriter: Arc<dyn QueryRewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    pub fn topics(mut self, topics: Arc<TopicRegistry>) -> Self {
        self.topics = Some(topics);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<AdaptiveRagEngine, DomainError> {
        self.config.validate()?;

        fn required<T>(value: Option<T>, name: &str) -> Result<T, DomainError> {
            value.ok_or_else(|| DomainError::configuration(format!("Engine is missing a {}", name)))
        }

        Ok(AdaptiveRagEngine {
            router: required(self.router, "router")?,
            sources: required(self.sources, "evidence source pair")?,
            relevance: required(self.relevance, "relevance grader")?,
            generator: required(self.generator, "generator")?,
            grounding: required(self.grounding, "grounding grader")?,
            answer: required(self.answer, "answer grader")?,
            rewriter: required(self.rewriter, "query rewriter")?,
            topics: self.topics.unwrap_or_default(),
            config: self.config,
        })
    }
}
