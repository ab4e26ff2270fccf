//! LLM provider and model-backed capabilities

mod classifier;
mod generator;
mod graders;
mod http_client;
mod openai_compatible;
mod router;

pub use classifier::{LlmClassifier, LlmSettings};
pub use generator::{LlmGenerator, LlmQueryRewriter};
pub use graders::{LlmAnswerGrader, LlmGroundingGrader, LlmRelevanceGrader};
pub use http_client::{HttpClient, HttpClientTrait};
pub use openai_compatible::{OpenAiCompatibleProvider, DEFAULT_BASE_URL};
pub use router::LlmQueryRouter;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
