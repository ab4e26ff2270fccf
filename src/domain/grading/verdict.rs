//! Categorical grading verdicts

use serde::{Deserialize, Serialize};

/// Whether a passage is usable for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceVerdict {
    Relevant,
    Irrelevant,
}

impl RelevanceVerdict {
    pub fn is_relevant(&self) -> bool {
        matches!(self, Self::Relevant)
    }
}

impl From<bool> for RelevanceVerdict {
    fn from(relevant: bool) -> Self {
        if relevant {
            Self::Relevant
        } else {
            Self::Irrelevant
        }
    }
}

/// Whether a candidate's claims are supported by its evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundingVerdict {
    Supported,
    NotSupported,
}

impl GroundingVerdict {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported)
    }
}

impl From<bool> for GroundingVerdict {
    fn from(supported: bool) -> Self {
        if supported {
            Self::Supported
        } else {
            Self::NotSupported
        }
    }
}

/// Whether a candidate addresses the question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerVerdict {
    Useful,
    NotUseful,
}

impl AnswerVerdict {
    pub fn is_useful(&self) -> bool {
        matches!(self, Self::Useful)
    }
}

impl From<bool> for AnswerVerdict {
    fn from(useful: bool) -> Self {
        if useful {
            Self::Useful
        } else {
            Self::NotUseful
        }
    }
}

/// Map a binary classifier label to a boolean
///
/// Only `yes` and `no` are accepted. Anything else is `None` and must be
/// treated as a classifier failure rather than defaulted.
pub fn parse_binary_score(label: &str) -> Option<bool> {
    match label.trim().trim_matches('"').to_lowercase().as_str() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binary_score() {
        assert_eq!(parse_binary_score("yes"), Some(true));
        assert_eq!(parse_binary_score(" NO "), Some(false));
        assert_eq!(parse_binary_score("\"Yes\""), Some(true));
        assert_eq!(parse_binary_score("maybe"), None);
        assert_eq!(parse_binary_score(""), None);
    }

    #[test]
    fn test_verdicts_from_bool() {
        assert!(RelevanceVerdict::from(true).is_relevant());
        assert!(!GroundingVerdict::from(false).is_supported());
        assert!(AnswerVerdict::from(true).is_useful());
    }

    #[test]
    fn test_verdict_serialization() {
        let json = serde_json::to_string(&GroundingVerdict::NotSupported).unwrap();
        assert_eq!(json, r#""not_supported""#);
    }
}
