//! Structured-output classification over a chat model

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::DomainError;

/// Model settings shared by the LLM-backed capabilities
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: Arc<dyn LlmProvider>,
    pub model: String,
    pub temperature: f32,
}

impl LlmSettings {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Asks the model for a JSON object and reads one string field out of it
#[derive(Debug, Clone)]
pub struct LlmClassifier {
    name: &'static str,
    settings: LlmSettings,
}

impl LlmClassifier {
    pub fn new(name: &'static str, settings: LlmSettings) -> Self {
        Self { name, settings }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the classifier and return the raw label found under `field`
    pub async fn classify(
        &self,
        system: &str,
        user: String,
        field: &str,
    ) -> Result<String, DomainError> {
        let request = LlmRequest::builder()
            .system(system)
            .user(user)
            .temperature(self.settings.temperature)
            .max_tokens(100)
            .json_output()
            .build();

        let response = self
            .settings
            .provider
            .chat(&self.settings.model, request)
            .await?;

        let label = read_label(response.content(), field).map_err(|e| {
            warn!(
                classifier = self.name,
                response = response.content(),
                "Unreadable classifier output"
            );
            e.with_classifier(self.name)
        })?;

        debug!(classifier = self.name, label = %label, "Classified");
        Ok(label)
    }
}

/// Extract the outermost JSON object from a string (handles prose and code fences)
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    if start < end {
        Some(&text[start..=end])
    } else {
        None
    }
}

struct LabelError(String);

impl LabelError {
    fn with_classifier(self, classifier: &str) -> DomainError {
        DomainError::invalid_label(classifier, self.0)
    }
}

fn read_label(content: &str, field: &str) -> Result<String, LabelError> {
    let json = extract_json(content)
        .ok_or_else(|| LabelError(format!("No JSON object in output: {}", content)))?;

    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| LabelError(format!("Invalid JSON output: {}", e)))?;

    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| LabelError(format!("Missing string field '{}'", field)))
}
