//! LLM graders
//!
//! Each grader asks for `{"binary_score": "yes" | "no"}`. Any other label is
//! reported as an invalid-label error.

use async_trait::async_trait;

use super::classifier::{LlmClassifier, LlmSettings};
use crate::domain::evidence::Passage;
use crate::domain::grading::{
    parse_binary_score, AnswerGrader, AnswerVerdict, Candidate, GroundingGrader, GroundingVerdict,
    RelevanceGrader, RelevanceVerdict,
};
use crate::domain::{DomainError, Question};

const BINARY_SCORE: &str = "binary_score";

const RELEVANCE_PROMPT: &str = "You are a grader assessing relevance of a retrieved document to a user question.\n\n\
If the document contains keyword(s) or semantic meaning related to the question, grade it as relevant.\n\n\
Give a binary score 'yes' or 'no' to indicate whether the document is relevant to the question. \
Respond with a JSON object: {\"binary_score\": \"yes\"} or {\"binary_score\": \"no\"}.";

const GROUNDING_PROMPT: &str = "You are a grader assessing whether an LLM generation is grounded in / supported by a set of retrieved facts.\n\n\
Give a binary score 'yes' or 'no'. 'Yes' means that the answer is grounded in / supported by the set of facts. \
Respond with a JSON object: {\"binary_score\": \"yes\"} or {\"binary_score\": \"no\"}.";

const ANSWER_PROMPT: &str = "You are a grader assessing whether an answer addresses / resolves a question.\n\n\
Give a binary score 'yes' or 'no'. 'Yes' means that the answer resolves the question. \
Respond with a JSON object: {\"binary_score\": \"yes\"} or {\"binary_score\": \"no\"}.";

async fn binary(classifier: &LlmClassifier, system: &str, user: String) -> Result<bool, DomainError> {
    let label = classifier.classify(system, user, BINARY_SCORE).await?;

    parse_binary_score(&label).ok_or_else(|| {
        DomainError::invalid_label(
            classifier.name(),
            format!("Expected 'yes' or 'no', got '{}'", label),
        )
    })
}

#[derive(Debug, Clone)]
pub struct LlmRelevanceGrader {
    classifier: LlmClassifier,
}

impl LlmRelevanceGrader {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            classifier: LlmClassifier::new("relevance", settings),
        }
    }
}

#[async_trait]
impl RelevanceGrader for LlmRelevanceGrader {
    async fn grade_relevance(
        &self,
        question: &Question,
        passage: &Passage,
    ) -> Result<RelevanceVerdict, DomainError> {
        let user = format!(
            "Retrieved document: \n\n {} \n\n User question: {}",
            passage.content, question
        );

        binary(&self.classifier, RELEVANCE_PROMPT, user).await.map(RelevanceVerdict::from)
    }

    fn grader_name(&self) -> &'static str {
        "llm_relevance"
    }
}

#[derive(Debug, Clone)]
pub struct LlmGroundingGrader {
    classifier: LlmClassifier,
}

impl LlmGroundingGrader {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            classifier: LlmClassifier::new("grounding", settings),
        }
    }
}

#[async_trait]
impl GroundingGrader for LlmGroundingGrader {
    async fn grade_grounding(&self, candidate: &Candidate) -> Result<GroundingVerdict, DomainError> {
        let user = format!(
            "Set of facts: \n\n {} \n\n LLM generation: {}",
            candidate.evidence.joined("\n\n"),
            candidate.answer
        );

        binary(&self.classifier, GROUNDING_PROMPT, user).await.map(GroundingVerdict::from)
    }

    fn grader_name(&self) -> &'static str {
        "llm_grounding"
    }
}

#[derive(Debug, Clone)]
pub struct LlmAnswerGrader {
    classifier: LlmClassifier,
}

impl LlmAnswerGrader {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            classifier: LlmClassifier::new("answer", settings),
        }
    }
}

#[async_trait]
impl AnswerGrader for LlmAnswerGrader {
    async fn grade_answer(
        &self,
        question: &Question,
        candidate: &Candidate,
    ) -> Result<AnswerVerdict, DomainError> {
        let user = format!(
            "User question: \n\n {} \n\n LLM generation: {}",
            question, candidate.answer
        );

        binary(&self.classifier, ANSWER_PROMPT, user).await.map(AnswerVerdict::from)
    }

    fn grader_name(&self) -> &'static str {
        "llm_answer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evidence::FilteredEvidenceSet;
    use crate::domain::llm::MockLlmProvider;
    use std::sync::Arc;

    fn settings(reply: &str) -> (Arc<MockLlmProvider>, LlmSettings) {
        let provider = Arc::new(MockLlmProvider::new("mock").with_content(reply));
        let settings = LlmSettings::new(provider.clone(), "llama-3.1-8b-instant");
        (provider, settings)
    }

    fn candidate() -> Candidate {
        Candidate::new(
            "Mars has two moons.",
            Question::new("How many moons does Mars have?").unwrap(),
            FilteredEvidenceSet::new(
                vec![
                    Passage::new("a", "Mars has two moons, Phobos and Deimos."),
                    Passage::new("b", "Mars is red."),
                ],
                3,
            ),
        )
    }

    #[tokio::test]
    async fn test_relevance_yes_no() {
        let (_, yes) = settings(r#"{"binary_score": "yes"}"#);
        let (_, no) = settings(r#"{"binary_score": "No"}"#);
        let question = Question::new("q").unwrap();
        let passage = Passage::new("a", "text");

        assert_eq!(
            LlmRelevanceGrader::new(yes).grade_relevance(&question, &passage).await.unwrap(),
            RelevanceVerdict::Relevant
        );
        assert_eq!(
            LlmRelevanceGrader::new(no).grade_relevance(&question, &passage).await.unwrap(),
            RelevanceVerdict::Irrelevant
        );
    }

    #[tokio::test]
    async fn test_unknown_label_never_defaults() {
        let (_, maybe) = settings(r#"{"binary_score": "maybe"}"#);
        let grader = LlmGroundingGrader::new(maybe);

        let result = grader.grade_grounding(&candidate()).await;

        assert!(matches!(result, Err(DomainError::InvalidLabel { .. })));
    }

    #[tokio::test]
    async fn test_grounding_prompt_carries_evidence() {
        let (provider, settings) = settings(r#"{"binary_score": "yes"}"#);
        let grader = LlmGroundingGrader::new(settings);

        let verdict = grader.grade_grounding(&candidate()).await.unwrap();

        assert_eq!(verdict, GroundingVerdict::Supported);
        let user = &provider.requests()[0].messages[1].content;
        assert!(user.contains("Phobos and Deimos.\n\nMars is red."));
        assert!(user.contains("LLM generation: Mars has two moons."));
    }

    #[tokio::test]
    async fn test_answer_grader() {
        let (_, settings) = settings(r#"{"binary_score": "no"}"#);
        let grader = LlmAnswerGrader::new(settings);
        let candidate = candidate();

        let verdict = grader.grade_answer(&candidate.question, &candidate).await.unwrap();

        assert_eq!(verdict, AnswerVerdict::NotUseful);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = Arc::new(MockLlmProvider::new("groq").with_error("503"));
        let grader = LlmAnswerGrader::new(LlmSettings::new(provider, "m"));
        let candidate = candidate();

        let result = grader.grade_answer(&candidate.question, &candidate).await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }
}
