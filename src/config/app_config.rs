use serde::Deserialize;

use crate::domain::engine::EngineConfig;
use crate::domain::routing::DEFAULT_TOPICS;
use crate::infrastructure::llm::DEFAULT_BASE_URL;
use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub web_search: WebSearchConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Concurrent runs per batch request
    pub batch_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub topics: Vec<String>,
}

/// OpenAI-compatible chat endpoint shared by every model-backed capability
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    /// Falls back to `GROQ_API_KEY`
    pub api_key: Option<String>,
    pub model: String,
    /// Model for routing; `model` when unset
    pub router_model: Option<String>,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    /// Falls back to `TAVILY_API_KEY`
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub search_depth: String,
}

/// Passages loaded into the in-memory index at startup
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CorpusConfig {
    #[serde(default)]
    pub path: Option<String>,
}

fn default_batch_concurrency() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: "llama-3.3-70b-versatile".to_string(),
            router_model: None,
            temperature: 0.0,
            request_timeout_secs: 60,
        }
    }
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            search_depth: "basic".to_string(),
        }
    }
}

impl LlmConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        non_empty(self.api_key.clone()).or_else(|| non_empty(std::env::var("GROQ_API_KEY").ok()))
    }

    pub fn router_model(&self) -> &str {
        self.router_model.as_deref().unwrap_or(&self.model)
    }
}

impl WebSearchConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        non_empty(self.api_key.clone())
            .or_else(|| non_empty(std::env::var("TAVILY_API_KEY").ok()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn logging_config(&self) -> crate::infrastructure::logging::LoggingConfig {
        crate::infrastructure::logging::LoggingConfig {
            level: self.logging.level.clone(),
            format: self.logging.format.clone(),
        }
    }
}
