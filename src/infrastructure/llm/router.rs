//! LLM query router

use async_trait::async_trait;

use super::classifier::{LlmClassifier, LlmSettings};
use crate::domain::evidence::RouteDecision;
use crate::domain::routing::{QueryRouter, TopicSnapshot};
use crate::domain::{DomainError, Question};

/// Routes by asking the model whether a question falls under the indexed
/// store's topics
#[derive(Debug, Clone)]
pub struct LlmQueryRouter {
    classifier: LlmClassifier,
}

impl LlmQueryRouter {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            classifier: LlmClassifier::new("router", settings),
        }
    }

    fn system_prompt(topics: &TopicSnapshot) -> String {
        format!(
            "You are an expert at routing a user question to either a vectorstore or web search.\n\n\
             The vectorstore contains information on the following topics:\n{}\n\n\
             If the question is related to these topics, route it to the vectorstore. \
             Otherwise, use web search.\n\n\
             Respond with a JSON object: {{\"datasource\": \"vectorstore\"}} or \
             {{\"datasource\": \"web_search\"}}.",
            topics.as_bullets()
        )
    }
}

#[async_trait]
impl QueryRouter for LlmQueryRouter {
    async fn route(
        &self,
        question: &Question,
        topics: &TopicSnapshot,
    ) -> Result<RouteDecision, DomainError> {
        let label = self
            .classifier
            .classify(
                &Self::system_prompt(topics),
                question.as_str().to_string(),
                "datasource",
            )
            .await?;

        RouteDecision::from_label(&label).ok_or_else(|| {
            DomainError::invalid_label(
                self.classifier.name(),
                format!("Unknown datasource '{}'", label),
            )
        })
    }

    fn router_name(&self) -> &'static str {
        "llm"
    }
}
