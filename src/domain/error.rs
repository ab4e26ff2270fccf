use thiserror::Error;

/// Core domain errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Invalid classifier output from {classifier}: {message}")]
    InvalidLabel { classifier: String, message: String },

    #[error("Timeout: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_label(classifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLabel {
            classifier: classifier.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error came from an exceeded call deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Question must not be empty");
        assert_eq!(
            error.to_string(),
            "Validation error: Question must not be empty"
        );
    }

    #[test]
    fn test_timeout_error() {
        let error = DomainError::timeout("retrieve", 1500);
        assert_eq!(error.to_string(), "Timeout: retrieve exceeded 1500ms");
        assert!(error.is_timeout());
        assert!(!DomainError::internal("boom").is_timeout());
    }

    #[test]
    fn test_invalid_label_error() {
        let error = DomainError::invalid_label("answer_grader", "unknown label 'maybe'");
        assert_eq!(
            error.to_string(),
            "Invalid classifier output from answer_grader: unknown label 'maybe'"
        );
    }
}
