//! Tavily live web search

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::evidence::{EvidenceSet, EvidenceSource, Passage, RetrievalRequest};
use crate::domain::DomainError;
use crate::infrastructure::llm::HttpClientTrait;

const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com";

/// Live search backed by the Tavily REST API
#[derive(Debug)]
pub struct TavilySearch<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
    search_depth: String,
}

impl<C: HttpClientTrait> TavilySearch<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_TAVILY_URL)
    }

    pub fn with_base_url(client: C, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            search_depth: "basic".to_string(),
        }
    }

    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f32>,
}

#[async_trait]
impl<C: HttpClientTrait> EvidenceSource for TavilySearch<C> {
    async fn retrieve(&self, request: RetrievalRequest) -> Result<EvidenceSet, DomainError> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": request.question.as_str(),
            "max_results": request.k,
            "search_depth": self.search_depth,
        });

        let url = self.search_url();
        let call = self
            .client
            .post_json(&url, vec![("Content-Type", "application/json")], &body);

        let json = tokio::time::timeout(request.timeout, call)
            .await
            .map_err(|_| DomainError::timeout("tavily search", request.timeout.as_millis() as u64))??;

        let response: SearchResponse = serde_json::from_value(json)
            .map_err(|e| DomainError::provider("tavily", format!("Failed to parse response: {}", e)))?;

        let set: EvidenceSet = response
            .results
            .into_iter()
            .filter(|hit| !hit.content.trim().is_empty())
            .map(|hit| {
                let mut passage = Passage::new(hit.url.clone(), hit.content).with_source(hit.url);
                if let Some(score) = hit.score {
                    passage = passage.with_score(score);
                }
                passage
            })
            .collect();

        debug!(k = request.k, returned = set.len(), "Tavily search");
        Ok(set.truncated(request.k))
    }

    fn source_name(&self) -> &'static str {
        "tavily"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Question;
    use crate::infrastructure::llm::MockHttpClient;
    use std::time::Duration;

    const SEARCH_URL: &str = "https://api.tavily.com/search";

    fn request(k: usize) -> RetrievalRequest {
        RetrievalRequest::new(Question::new("latest rust release").unwrap(), k, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let client = MockHttpClient::new().with_response(
            SEARCH_URL,
            serde_json::json!({
                "query": "latest rust release",
                "results": [
                    {"title": "Rust blog", "url": "https://blog.rust-lang.org", "content": "Rust 1.90 released", "score": 0.91},
                    {"title": "Empty", "url": "https://example.com", "content": ""},
                    {"title": "News", "url": "https://news.example.com", "content": "Rust news"}
                ]
            }),
        );
        let search = TavilySearch::new(client, "tvly-key");

        let set = search.retrieve(request(3)).await.unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.passages()[0].source.as_deref(), Some("https://blog.rust-lang.org"));
        assert_eq!(set.passages()[0].score, Some(0.91));

        let body = &search.client.bodies()[0];
        assert_eq!(body["max_results"], 3);
        assert_eq!(body["query"], "latest rust release");
    }

    #[tokio::test]
    async fn test_search_truncates_to_k() {
        let client = MockHttpClient::new().with_response(
            SEARCH_URL,
            serde_json::json!({"results": [
                {"url": "a", "content": "one"},
                {"url": "b", "content": "two"}
            ]}),
        );
        let search = TavilySearch::new(client, "key");

        assert_eq!(search.retrieve(request(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_error() {
        let client = MockHttpClient::new().with_error(SEARCH_URL, "HTTP 401");
        let search = TavilySearch::new(client, "bad");

        assert!(search.retrieve(request(3)).await.is_err());
    }
}
