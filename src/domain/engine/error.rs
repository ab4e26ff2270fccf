//! Engine failure taxonomy

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::EngineState;
use crate::domain::evidence::RouteDecision;
use crate::domain::DomainError;

/// Failures observed by the engine during a run
///
/// Carried in run diagnostics; the engine itself never returns one as an
/// `Err`.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineError {
    #[error("Routing unavailable: {message}")]
    RoutingUnavailable { message: String },

    #[error("Retrieval from {provider} timed out after {timeout_ms}ms")]
    RetrievalTimeout { provider: String, timeout_ms: u64 },

    #[error("Evidence source {provider} failed: {message}")]
    SourceError { provider: String, message: String },

    #[error("No relevant evidence on route {route}")]
    EmptyEvidence { route: RouteDecision },

    #[error("Generation failed: {message}")]
    GenerationError { message: String },

    #[error("Grader {grader} unavailable: {message}")]
    GradingUnavailable { grader: String, message: String },

    #[error("Query rewrite unavailable: {message}")]
    RewriteUnavailable { message: String },

    #[error("{stage} call timed out after {timeout_ms}ms")]
    CallTimeout { stage: EngineState, timeout_ms: u64 },

    #[error("Invalid question: {message}")]
    InvalidQuestion { message: String },
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoutingUnavailable { .. } => "ROUTING_UNAVAILABLE",
            Self::RetrievalTimeout { .. } => "RETRIEVAL_TIMEOUT",
            Self::SourceError { .. } => "SOURCE_ERROR",
            Self::EmptyEvidence { .. } => "EMPTY_EVIDENCE",
            Self::GenerationError { .. } => "GENERATION_ERROR",
            Self::GradingUnavailable { .. } => "GRADING_UNAVAILABLE",
            Self::RewriteUnavailable { .. } => "REWRITE_UNAVAILABLE",
            Self::CallTimeout { .. } => "CALL_TIMEOUT",
            Self::InvalidQuestion { .. } => "INVALID_QUESTION",
        }
    }

    /// Errors the engine may recover from by rerouting or retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RetrievalTimeout { .. }
                | Self::SourceError { .. }
                | Self::EmptyEvidence { .. }
                | Self::GenerationError { .. }
        )
    }

    pub fn routing(error: DomainError) -> Self {
        Self::RoutingUnavailable {
            message: error.to_string(),
        }
    }

    pub fn grading(grader: impl Into<String>, error: DomainError) -> Self {
        Self::GradingUnavailable {
            grader: grader.into(),
            message: error.to_string(),
        }
    }

    pub fn generation(error: DomainError) -> Self {
        Self::GenerationError {
            message: error.to_string(),
        }
    }

    pub fn rewrite(error: DomainError) -> Self {
        Self::RewriteUnavailable {
            message: error.to_string(),
        }
    }

    /// Classify a failed retrieval call
    pub fn retrieval(provider: impl Into<String>, error: DomainError) -> Self {
        match error {
            DomainError::Timeout { timeout_ms, .. } => Self::RetrievalTimeout {
                provider: provider.into(),
                timeout_ms,
            },
            other => Self::SourceError {
                provider: provider.into(),
                message: other.to_string(),
            },
        }
    }
}
