//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CorpusConfig, LlmConfig, LogFormat, LoggingConfig, RouterConfig, ServerConfig,
    WebSearchConfig,
};
