//! Domain layer - Core types and capabilities

pub mod engine;
pub mod error;
pub mod evidence;
pub mod generation;
pub mod grading;
pub mod llm;
pub mod question;
pub mod routing;

pub use engine::{
    AdaptiveEngine, Diagnostics, EngineConfig, EngineError, EngineState, ExhaustionReason,
    RewritePolicy, RunOutcome, RunResult, RunState,
};
pub use error::DomainError;
pub use evidence::{
    EvidenceSet, EvidenceSource, EvidenceSources, FilteredEvidenceSet, Passage, RetrievalRequest,
    RouteDecision,
};
pub use generation::{Generator, QueryRewriter};
pub use grading::{
    AnswerGrader, AnswerVerdict, Candidate, GroundingGrader, GroundingVerdict, RelevanceGrader,
    RelevanceVerdict,
};
pub use llm::{FinishReason, LlmProvider, LlmRequest, LlmResponse, Message, MessageRole, Usage};
pub use question::Question;
pub use routing::{QueryRouter, TopicRegistry, TopicSnapshot};
