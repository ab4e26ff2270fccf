//! Adaptive engine domain
//!
//! Configuration, state, and result model of the route, retrieve, grade and
//! retry loop. The loop itself lives in the infrastructure layer.

mod config;
mod error;
mod result;
mod state;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use config::{EngineConfig, RewritePolicy, SourceRetryConfig};
pub use error::EngineError;
pub use result::{AttemptRecord, Diagnostics, ExhaustionReason, RunOutcome, RunResult};
pub use state::{EngineState, RunParts, RunState};

use crate::domain::Question;

/// Answers one question end to end
///
/// Every terminal, including failures and cancellation, comes back as a
/// [`RunResult`]; a run never yields an `Err`.
#[async_trait]
pub trait AdaptiveEngine: Send + Sync {
    async fn run(&self, question: Question, cancel: CancellationToken) -> RunResult;

    /// Validate raw text, then run; blank text yields an `InvalidQuestion` result
    async fn ask(&self, text: &str, cancel: CancellationToken) -> RunResult {
        match Question::new(text) {
            Ok(question) => self.run(question, cancel).await,
            Err(error) => RunResult::rejected(Uuid::new_v4().to_string(), text, error.to_string()),
        }
    }
}
