//! Engine implementation and batch evaluation

mod adaptive;
mod batch;

pub use adaptive::{AdaptiveRagEngine, AdaptiveRagEngineBuilder};
pub use batch::{contains_citation, BatchReport, BatchRunner, OutcomeCounts, RoutingSummary, CITATION_PHRASES};
