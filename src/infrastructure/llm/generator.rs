//! LLM answer generation and query rewriting

use async_trait::async_trait;
use tracing::{debug, warn};

use super::classifier::LlmSettings;
use crate::domain::evidence::FilteredEvidenceSet;
use crate::domain::generation::{Generator, QueryRewriter};
use crate::domain::llm::LlmRequest;
use crate::domain::{DomainError, Question};

const CONTEXT_SEPARATOR: &str = "\n\n";

const REWRITE_PROMPT: &str = "You are a question re-writer that converts an input question to a better version \
that is optimized for retrieval. Look at the input and reason about the underlying semantic intent. \
Reply with the improved question only.";

/// Answers from the relevant passages only
#[derive(Debug, Clone)]
pub struct LlmGenerator {
    settings: LlmSettings,
    max_tokens: Option<u32>,
}

impl LlmGenerator {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            settings,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn build_prompt(question: &Question, evidence: &FilteredEvidenceSet) -> String {
        format!(
            "You are a helpful assistant that answers questions based on the following context.\n\
             Use the provided context to answer the question.\n\n\
             Context: {}\n\
             Question: {}\n\
             Answer:",
            evidence.joined(CONTEXT_SEPARATOR),
            question
        )
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(
        &self,
        question: &Question,
        evidence: &FilteredEvidenceSet,
    ) -> Result<String, DomainError> {
        let mut builder = LlmRequest::builder()
            .user(Self::build_prompt(question, evidence))
            .temperature(self.settings.temperature);

        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        debug!(passages = evidence.len(), model = %self.settings.model, "Generating answer");

        let response = self
            .settings
            .provider
            .chat(&self.settings.model, builder.build())
            .await?;

        if response.is_truncated() {
            warn!(model = %self.settings.model, "Answer hit the token limit and may be cut off");
        }

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Generation usage"
            );
        }

        let answer = response.content().trim();
        if answer.is_empty() {
            return Err(DomainError::provider(
                self.settings.provider.provider_name(),
                "Empty answer from model",
            ));
        }

        Ok(answer.to_string())
    }

    fn generator_name(&self) -> &'static str {
        "llm"
    }
}

/// Rephrases a question for better retrieval
#[derive(Debug, Clone)]
pub struct LlmQueryRewriter {
    settings: LlmSettings,
}

impl LlmQueryRewriter {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl QueryRewriter for LlmQueryRewriter {
    async fn rewrite(&self, question: &Question) -> Result<Question, DomainError> {
        let request = LlmRequest::builder()
            .system(REWRITE_PROMPT)
            .user(format!(
                "Here is the initial question: \n\n {} \n Formulate an improved question.",
                question
            ))
            .temperature(self.settings.temperature)
            .max_tokens(200)
            .build();

        let response = self
            .settings
            .provider
            .chat(&self.settings.model, request)
            .await?;

        let text = response.content().trim().trim_matches('"');
        Question::new(text)
    }

    fn rewriter_name(&self) -> &'static str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evidence::Passage;
    use crate::domain::llm::MockLlmProvider;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_generate_formats_context() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_content("  Phobos and Deimos. "));
        let generator = LlmGenerator::new(LlmSettings::new(provider.clone(), "m")).with_max_tokens(256);
        let evidence = FilteredEvidenceSet::new(
            vec![Passage::new("a", "first"), Passage::new("b", "second")],
            2,
        );

        let answer = generator
            .generate(&Question::new("Moons of Mars?").unwrap(), &evidence)
            .await
            .unwrap();

        assert_eq!(answer, "Phobos and Deimos.");
        let request = &provider.requests()[0];
        assert!(request.messages[0].content.contains("Context: first\n\nsecond"));
        assert!(request.messages[0].content.contains("Question: Moons of Mars?"));
        assert_eq!(request.max_tokens, Some(256));
    }

    #[tokio::test]
    async fn test_generate_empty_answer_is_error() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_content("   "));
        let generator = LlmGenerator::new(LlmSettings::new(provider, "m"));

        let result = generator
            .generate(&Question::new("q").unwrap(), &FilteredEvidenceSet::default())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rewrite_returns_new_question() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_content("\"What are the moons of Mars?\""));
        let rewriter = LlmQueryRewriter::new(LlmSettings::new(provider, "m"));

        let original = Question::new("mars moons").unwrap();
        let rewritten = rewriter.rewrite(&original).await.unwrap();

        assert_eq!(rewritten.as_str(), "What are the moons of Mars?");
        assert_eq!(original.as_str(), "mars moons");
    }

    #[tokio::test]
    async fn test_rewrite_blank_output_is_error() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_content(""));
        let rewriter = LlmQueryRewriter::new(LlmSettings::new(provider, "m"));

        assert!(rewriter.rewrite(&Question::new("q").unwrap()).await.is_err());
    }
}
