//! Engine configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::evidence::RouteDecision;
use crate::domain::DomainError;

/// What a rewrite-triggered retry does with the run's route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewritePolicy {
    /// Re-retrieve from the same source with the rewritten question
    #[default]
    KeepRoute,
    /// Ask the router again with the rewritten question
    Reroute,
}

/// Local retry policy for transient evidence source failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceRetryConfig {
    /// Retries after the first failed call
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for SourceRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_delay_ms: 200,
            max_delay_ms: 2000,
            backoff_multiplier: 2.0,
        }
    }
}

impl SourceRetryConfig {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (0-indexed)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(retry as i32);
        Duration::from_millis(delay.min(self.max_delay_ms as f64) as u64)
    }
}

/// Configuration surface of the adaptive engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Top-k for the indexed store
    pub vectorstore_k: usize,
    /// Top-k for live search
    pub web_search_k: usize,
    /// Generation attempts per run, rewrite retries included
    pub max_attempts: u32,
    /// Empty-evidence or source-failure reroutes per attempt
    pub max_reroutes: u32,
    /// Deadline applied to every external call
    pub call_timeout_ms: u64,
    pub rewrite_policy: RewritePolicy,
    /// Treat a call timeout as a retry trigger instead of aborting the run
    pub timeout_counts_as_retry: bool,
    /// Fall back to live search when the indexed store keeps failing
    pub reroute_on_source_error: bool,
    pub source_retry: SourceRetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vectorstore_k: 4,
            web_search_k: 3,
            max_attempts: 3,
            max_reroutes: 1,
            call_timeout_ms: 30_000,
            rewrite_policy: RewritePolicy::default(),
            timeout_counts_as_retry: false,
            reroute_on_source_error: true,
            source_retry: SourceRetryConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_max_reroutes(mut self, max_reroutes: u32) -> Self {
        self.max_reroutes = max_reroutes;
        self
    }

    pub fn with_k(mut self, vectorstore_k: usize, web_search_k: usize) -> Self {
        self.vectorstore_k = vectorstore_k;
        self.web_search_k = web_search_k;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_rewrite_policy(mut self, policy: RewritePolicy) -> Self {
        self.rewrite_policy = policy;
        self
    }

    pub fn with_timeout_counts_as_retry(mut self, enabled: bool) -> Self {
        self.timeout_counts_as_retry = enabled;
        self
    }

    pub fn with_reroute_on_source_error(mut self, enabled: bool) -> Self {
        self.reroute_on_source_error = enabled;
        self
    }

    pub fn with_source_retry(mut self, retry: SourceRetryConfig) -> Self {
        self.source_retry = retry;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Retrieval depth for a route
    pub fn k_for(&self, route: RouteDecision) -> usize {
        match route {
            RouteDecision::Vectorstore => self.vectorstore_k,
            RouteDecision::WebSearch => self.web_search_k,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_attempts == 0 {
            return Err(DomainError::configuration("max_attempts must be at least 1"));
        }

        if self.vectorstore_k == 0 || self.web_search_k == 0 {
            return Err(DomainError::configuration("retrieval k must be at least 1"));
        }

        if self.call_timeout_ms == 0 {
            return Err(DomainError::configuration("call_timeout_ms must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();

        assert_eq!(config.k_for(RouteDecision::Vectorstore), 4);
        assert_eq!(config.k_for(RouteDecision::WebSearch), 3);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.rewrite_policy, RewritePolicy::KeepRoute);
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(EngineConfig::new().with_max_attempts(0).validate().is_err());
        assert!(EngineConfig::new().with_k(0, 3).validate().is_err());
        assert!(EngineConfig::new()
            .with_call_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_source_retry_backoff() {
        let retry = SourceRetryConfig::default();

        assert_eq!(retry.delay_for_retry(0), Duration::from_millis(200));
        assert_eq!(retry.delay_for_retry(1), Duration::from_millis(400));
        assert_eq!(retry.delay_for_retry(10), Duration::from_millis(2000));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"max_attempts": 5, "rewrite_policy": "reroute"}"#).unwrap();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.rewrite_policy, RewritePolicy::Reroute);
        assert_eq!(config.vectorstore_k, 4);
    }
}
