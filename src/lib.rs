//! Adaptive RAG
//!
//! Answers questions by routing them to an indexed store or live web search,
//! grading what comes back, generating an answer and checking it for
//! grounding and usefulness, rewriting the question and retrying within a
//! bounded budget when a check fails.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use api::state::AppState;
use domain::evidence::EvidenceSources;
use domain::llm::LlmProvider;
use domain::routing::TopicRegistry;
use infrastructure::engine::{AdaptiveRagEngine, BatchRunner};
use infrastructure::evidence::{InMemoryIndex, TavilySearch};
use infrastructure::llm::{
    HttpClient, LlmAnswerGrader, LlmGenerator, LlmGroundingGrader, LlmQueryRewriter,
    LlmQueryRouter, LlmRelevanceGrader, LlmSettings, OpenAiCompatibleProvider,
};

/// The engine together with the index it reads from
pub struct Components {
    pub engine: Arc<AdaptiveRagEngine>,
    pub index: Arc<InMemoryIndex>,
}

/// Wire providers, sources and graders from configuration
pub async fn create_components(config: &AppConfig) -> anyhow::Result<Components> {
    config
        .engine
        .validate()
        .context("Invalid engine configuration")?;

    let provider = create_llm_provider(config)?;
    let settings = LlmSettings::new(provider, config.llm.model.clone())
        .with_temperature(config.llm.temperature);
    let router_settings = LlmSettings::new(settings.provider.clone(), config.llm.router_model())
        .with_temperature(config.llm.temperature);

    let index = Arc::new(load_index(config).await?);
    let web_search = create_web_search(config)?;

    let topics = Arc::new(
        TopicRegistry::new(config.router.topics.clone()).context("Invalid router topics")?,
    );

    let engine = AdaptiveRagEngine::builder()
        .router(Arc::new(LlmQueryRouter::new(router_settings)))
        .sources(EvidenceSources::new(index.clone(), web_search))
        .relevance_grader(Arc::new(LlmRelevanceGrader::new(settings.clone())))
        .generator(Arc::new(LlmGenerator::new(settings.clone())))
        .grounding_grader(Arc::new(LlmGroundingGrader::new(settings.clone())))
        .answer_grader(Arc::new(LlmAnswerGrader::new(settings.clone())))
        .rewriter(Arc::new(LlmQueryRewriter::new(settings)))
        .topics(topics)
        .config(config.engine.clone())
        .build()?;

    info!(
        model = %config.llm.model,
        router_model = %config.llm.router_model(),
        max_attempts = config.engine.max_attempts,
        "Adaptive engine ready"
    );

    Ok(Components {
        engine: Arc::new(engine),
        index,
    })
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(
    config: &AppConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<AppState> {
    let components = create_components(config).await?;
    let batch = BatchRunner::new(components.engine.clone())
        .with_concurrency(config.server.batch_concurrency);

    Ok(AppState {
        topics: components.engine.topics().clone(),
        engine: components.engine,
        index: components.index,
        batch,
        shutdown,
    })
}

fn create_llm_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let api_key = config
        .llm
        .resolved_api_key()
        .context("No LLM API key: set llm.api_key or GROQ_API_KEY")?;

    let client = HttpClient::with_timeout(Duration::from_secs(config.llm.request_timeout_secs))?;

    info!(base_url = %config.llm.base_url, "Using OpenAI-compatible LLM endpoint");

    Ok(Arc::new(OpenAiCompatibleProvider::with_base_url(
        client,
        api_key,
        config.llm.base_url.clone(),
    )))
}

fn create_web_search(config: &AppConfig) -> anyhow::Result<Arc<TavilySearch<HttpClient>>> {
    let api_key = config
        .web_search
        .resolved_api_key()
        .context("No web search API key: set web_search.api_key or TAVILY_API_KEY")?;

    let client = HttpClient::new();
    let search = match &config.web_search.base_url {
        Some(base_url) => TavilySearch::with_base_url(client, api_key, base_url.clone()),
        None => TavilySearch::new(client, api_key),
    };

    Ok(Arc::new(
        search.with_search_depth(config.web_search.search_depth.clone()),
    ))
}

async fn load_index(config: &AppConfig) -> anyhow::Result<InMemoryIndex> {
    let Some(path) = &config.corpus.path else {
        warn!("No corpus configured; the indexed store starts empty");
        return Ok(InMemoryIndex::new());
    };

    InMemoryIndex::from_json_file(path)
        .await
        .with_context(|| format!("Failed to load corpus from {}", path))
}
