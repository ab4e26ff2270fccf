use serde::{Deserialize, Serialize};

use crate::domain::engine::RunResult;
use crate::infrastructure::engine::BatchReport;

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchAskRequest {
    pub questions: Vec<String>,
    /// Overrides the configured batch concurrency
    #[serde(default)]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchAskResponse {
    pub results: Vec<RunResult>,
    pub report: BatchReport,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTopicsRequest {
    pub topics: Vec<String>,
}
