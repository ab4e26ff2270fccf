use async_trait::async_trait;
use std::time::Duration;

use crate::domain::DomainError;

/// JSON-over-HTTP operations used by the providers (mockable)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;
}

/// Longest error body kept in a provider error
const MAX_ERROR_BODY: usize = 500;

/// reqwest-backed client
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: None,
        }
    }

    /// Client whose requests fail with [`DomainError::Timeout`] after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: Some(timeout),
        })
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.map(|t| t.as_millis() as u64).unwrap_or_default()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                DomainError::timeout(format!("POST {}", url), self.timeout_ms())
            } else {
                DomainError::provider("http", format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(DomainError::provider("http", format!("HTTP {}: {}", status, error_body)));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::provider("http", format!("Failed to parse response: {}", e)))
    }
}
