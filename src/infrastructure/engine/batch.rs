//! Batch evaluation over independent concurrent runs

use std::fmt::Write as _;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::engine::{AdaptiveEngine, RunOutcome, RunResult};
use crate::domain::evidence::RouteDecision;

/// Phrases taken as a sign the answer cites its context
pub const CITATION_PHRASES: &[&str] = &[
    "according to",
    "based on",
    "the document",
    "the context",
    "as mentioned",
];

/// Runs many questions through one engine
///
/// Each question is its own run with its own state. At most `concurrency`
/// runs are in flight; results come back in input order.
#[derive(Clone)]
pub struct BatchRunner {
    engine: Arc<dyn AdaptiveEngine>,
    concurrency: usize,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl BatchRunner {
    pub fn new(engine: Arc<dyn AdaptiveEngine>) -> Self {
        Self {
            engine,
            concurrency: 4,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run every question; a cancelled token cancels the runs not yet finished
    pub async fn run<S: AsRef<str>>(&self, questions: &[S], cancel: CancellationToken) -> Vec<RunResult> {
        info!(questions = questions.len(), concurrency = self.concurrency, "Starting batch");

        let questions: Vec<String> = questions.iter().map(|q| q.as_ref().to_owned()).collect();

        stream::iter(questions)
            .map(|question| {
                let engine = self.engine.clone();
                let cancel = cancel.child_token();
                async move { engine.ask(&question, cancel).await }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Run and summarize
    pub async fn evaluate<S: AsRef<str>>(
        &self,
        questions: &[S],
        cancel: CancellationToken,
    ) -> (Vec<RunResult>, BatchReport) {
        let results = self.run(questions, cancel).await;
        let report = BatchReport::from_results(&results);
        (results, report)
    }
}

/// Outcome counts of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub done: usize,
    pub failed_to_converge: usize,
    pub cancelled: usize,
    pub fatal_error: usize,
}

/// Route distribution of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingSummary {
    pub vectorstore: usize,
    pub web_search: usize,
    /// Runs that ended before a route was chosen
    pub unrouted: usize,
    pub vectorstore_percentage: f64,
    pub web_search_percentage: f64,
}

/// Aggregate metrics over a batch of runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total_questions: usize,
    pub outcomes: OutcomeCounts,
    pub routing: RoutingSummary,
    pub avg_attempts: f64,
    pub avg_latency_ms: f64,
    pub fastest_ms: u64,
    pub slowest_ms: u64,
    pub avg_answer_words: f64,
    pub longest_answer_words: usize,
    pub shortest_answer_words: usize,
    pub avg_documents_used: f64,
    pub answers_with_citations: usize,
    pub citation_percentage: f64,
    pub answers_with_context: usize,
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn mean(sum: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Whether an answer contains one of the [`CITATION_PHRASES`]
pub fn contains_citation(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    CITATION_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

impl BatchReport {
    pub fn from_results(results: &[RunResult]) -> Self {
        let total = results.len();
        if total == 0 {
            return Self::default();
        }

        let mut report = Self {
            total_questions: total,
            ..Default::default()
        };

        let mut attempts = 0u64;
        let mut latency = 0u64;
        let mut words = Vec::with_capacity(total);
        let mut documents = 0usize;

        report.fastest_ms = u64::MAX;

        for result in results {
            match result.outcome {
                RunOutcome::Done => report.outcomes.done += 1,
                RunOutcome::FailedToConverge => report.outcomes.failed_to_converge += 1,
                RunOutcome::Cancelled => report.outcomes.cancelled += 1,
                RunOutcome::FatalError => report.outcomes.fatal_error += 1,
            }

            match result.route_taken {
                Some(RouteDecision::Vectorstore) => report.routing.vectorstore += 1,
                Some(RouteDecision::WebSearch) => report.routing.web_search += 1,
                None => report.routing.unrouted += 1,
            }

            attempts += result.attempts as u64;
            latency += result.duration_ms;
            report.fastest_ms = report.fastest_ms.min(result.duration_ms);
            report.slowest_ms = report.slowest_ms.max(result.duration_ms);

            let answer = result.final_answer.as_deref().unwrap_or("");
            words.push(answer.split_whitespace().count());
            if contains_citation(answer) {
                report.answers_with_citations += 1;
            }

            let used = result.documents_used();
            documents += used;
            if used > 0 {
                report.answers_with_context += 1;
            }
        }

        report.routing.vectorstore_percentage = percentage(report.routing.vectorstore, total);
        report.routing.web_search_percentage = percentage(report.routing.web_search, total);
        report.avg_attempts = mean(attempts as f64, total);
        report.avg_latency_ms = mean(latency as f64, total);
        report.avg_answer_words = mean(words.iter().sum::<usize>() as f64, total);
        report.longest_answer_words = words.iter().copied().max().unwrap_or(0);
        report.shortest_answer_words = words.iter().copied().min().unwrap_or(0);
        report.avg_documents_used = mean(documents as f64, total);
        report.citation_percentage = percentage(report.answers_with_citations, total);

        report
    }

    /// Human-readable summary for terminals
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Questions:          {}", self.total_questions);
        let _ = writeln!(
            out,
            "Outcomes:           done={} failed_to_converge={} cancelled={} fatal_error={}",
            self.outcomes.done,
            self.outcomes.failed_to_converge,
            self.outcomes.cancelled,
            self.outcomes.fatal_error
        );
        let _ = writeln!(
            out,
            "Routing:            vectorstore={} ({:.1}%) web_search={} ({:.1}%)",
            self.routing.vectorstore,
            self.routing.vectorstore_percentage,
            self.routing.web_search,
            self.routing.web_search_percentage
        );
        let _ = writeln!(out, "Avg attempts:       {:.2}", self.avg_attempts);
        let _ = writeln!(
            out,
            "Latency ms:         avg={:.0} fastest={} slowest={}",
            self.avg_latency_ms, self.fastest_ms, self.slowest_ms
        );
        let _ = writeln!(
            out,
            "Answer words:       avg={:.1} longest={} shortest={}",
            self.avg_answer_words, self.longest_answer_words, self.shortest_answer_words
        );
        let _ = writeln!(out, "Avg documents used: {:.1}", self.avg_documents_used);
        let _ = writeln!(
            out,
            "Citations:          {} ({:.1}%)",
            self.answers_with_citations, self.citation_percentage
        );
        out
    }
}
