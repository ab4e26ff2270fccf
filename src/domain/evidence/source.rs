//! Evidence source capability

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::passage::{EvidenceSet, RouteDecision};
use crate::domain::{DomainError, Question};

/// Parameters for one retrieval call
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub question: Question,
    /// Maximum number of passages to return
    pub k: usize,
    /// Deadline the source must respect
    pub timeout: Duration,
}

impl RetrievalRequest {
    pub fn new(question: Question, k: usize, timeout: Duration) -> Self {
        Self {
            question,
            k,
            timeout,
        }
    }
}

/// A provider of ranked passages for a question
///
/// Implementations return between 0 and `k` passages. An empty set is a
/// valid answer, not an error.
#[async_trait]
pub trait EvidenceSource: Send + Sync + Debug {
    async fn retrieve(&self, request: RetrievalRequest) -> Result<EvidenceSet, DomainError>;

    /// Short name used in logs and metrics
    fn source_name(&self) -> &'static str;
}

/// The indexed store and live search, selected by [`RouteDecision`]
#[derive(Debug, Clone)]
pub struct EvidenceSources {
    indexed: Arc<dyn EvidenceSource>,
    live: Arc<dyn EvidenceSource>,
}

impl EvidenceSources {
    pub fn new(indexed: Arc<dyn EvidenceSource>, live: Arc<dyn EvidenceSource>) -> Self {
        Self { indexed, live }
    }

    pub fn for_route(&self, route: RouteDecision) -> &Arc<dyn EvidenceSource> {
        match route {
            RouteDecision::Vectorstore => &self.indexed,
            RouteDecision::WebSearch => &self.live,
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::evidence::Passage;
    use std::sync::Mutex;

    /// Mock evidence source for testing
    ///
    /// Responses are consumed in order; the last one repeats.
    #[derive(Debug)]
    pub struct MockEvidenceSource {
        name: &'static str,
        responses: Mutex<Vec<Result<Vec<Passage>, DomainError>>>,
        delay: Option<Duration>,
        queries: Mutex<Vec<String>>,
    }

    impl MockEvidenceSource {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                responses: Mutex::new(Vec::new()),
                delay: None,
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn with_passages(self, passages: Vec<Passage>) -> Self {
            self.responses.lock().unwrap().push(Ok(passages));
            self
        }

        pub fn with_error(self, error: DomainError) -> Self {
            self.responses.lock().unwrap().push(Err(error));
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Question texts this source was called with
        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EvidenceSource for MockEvidenceSource {
        async fn retrieve(&self, request: RetrievalRequest) -> Result<EvidenceSet, DomainError> {
            self.queries
                .lock()
                .unwrap()
                .push(request.question.as_str().to_string());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let next = {
                let mut responses = self.responses.lock().unwrap();
                match responses.len() {
                    0 => Ok(Vec::new()),
                    1 => responses[0].clone(),
                    _ => responses.remove(0),
                }
            };

            next.map(|passages| EvidenceSet::new(passages).truncated(request.k))
        }

        fn source_name(&self) -> &'static str {
            self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockEvidenceSource;
    use super::*;
    use crate::domain::evidence::Passage;

    #[tokio::test]
    async fn test_sources_select_by_route() {
        let indexed = Arc::new(MockEvidenceSource::new("indexed"));
        let live = Arc::new(MockEvidenceSource::new("live"));
        let sources = EvidenceSources::new(indexed, live);

        assert_eq!(
            sources.for_route(RouteDecision::Vectorstore).source_name(),
            "indexed"
        );
        assert_eq!(
            sources.for_route(RouteDecision::WebSearch).source_name(),
            "live"
        );
    }

    #[tokio::test]
    async fn test_mock_source_respects_k() {
        let source = MockEvidenceSource::new("indexed").with_passages(vec![
            Passage::new("a", "one"),
            Passage::new("b", "two"),
            Passage::new("c", "three"),
        ]);
        let question = Question::new("anything").unwrap();

        let set = source
            .retrieve(RetrievalRequest::new(question, 2, Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(source.queries(), vec!["anything".to_string()]);
    }
}
