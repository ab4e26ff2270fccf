use serde::{Deserialize, Serialize};

use super::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    /// Any label the provider reports that we do not model
    Other,
}

impl FinishReason {
    pub fn from_label(label: &str) -> Self {
        match label {
            "stop" | "eos" => Self::Stop,
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// One chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub id: String,
    pub model: String,
    pub message: Message,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<Usage>,
}

impl LlmResponse {
    pub fn new(id: String, model: String, message: Message) -> Self {
        Self {
            id,
            model,
            message,
            finish_reason: None,
            usage: None,
        }
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn content(&self) -> &str {
        self.message.content_text()
    }

    /// Whether the model stopped at the token limit
    pub fn is_truncated(&self) -> bool {
        self.finish_reason == Some(FinishReason::Length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_calculation() {
        let usage = Usage::new(10, 20);
        assert_eq!(usage.total_tokens, 30);
    }

    #[test]
    fn test_finish_reason_labels() {
        assert_eq!(FinishReason::from_label("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from_label("length"), FinishReason::Length);
        assert_eq!(FinishReason::from_label("tool_calls"), FinishReason::Other);
    }

    #[test]
    fn test_response_content() {
        let response = LlmResponse::new(
            "id-123".to_string(),
            "llama-3.1-8b-instant".to_string(),
            Message::assistant(r#"{"binary_score": "yes"}"#),
        );

        assert_eq!(response.content(), r#"{"binary_score": "yes"}"#);
        assert!(!response.is_truncated());
        assert!(response
            .with_finish_reason(FinishReason::Length)
            .is_truncated());
    }
}
