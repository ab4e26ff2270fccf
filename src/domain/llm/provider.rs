use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Chat-completion backend shared by every model-driven capability
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::llm::Message;
    use std::sync::Mutex;

    /// Mock provider replying with scripted contents; the last one repeats
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: &'static str,
        replies: Mutex<Vec<Result<String, DomainError>>>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                replies: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_content(self, content: impl Into<String>) -> Self {
            self.replies.lock().unwrap().push(Ok(content.into()));
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            let error = DomainError::provider(self.name, error);
            self.replies.lock().unwrap().push(Err(error));
            self
        }

        /// Requests received so far
        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
            self.requests.lock().unwrap().push(request);

            let reply = {
                let mut replies = self.replies.lock().unwrap();
                match replies.len() {
                    0 => Err(DomainError::provider(self.name, "No mock response configured")),
                    1 => replies[0].clone(),
                    _ => replies.remove(0),
                }
            };

            reply.map(|content| {
                LlmResponse::new(
                    "mock-response".to_string(),
                    model.to_string(),
                    Message::assistant(content),
                )
            })
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}
