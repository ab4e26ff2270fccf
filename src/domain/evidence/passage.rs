//! Passages and evidence sets

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which evidence source a question is answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// The local indexed document store
    Vectorstore,
    /// Live web search
    WebSearch,
}

impl RouteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vectorstore => "vectorstore",
            Self::WebSearch => "web_search",
        }
    }

    /// Parse a router label; only the two known labels are accepted
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "vectorstore" => Some(Self::Vectorstore),
            "web_search" | "websearch" => Some(Self::WebSearch),
            _ => None,
        }
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrieved unit of evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Document id or URL
    pub id: String,
    /// Opaque text content
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Relevance score reported by the source, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Passage {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            source: None,
            score: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Ordered passages returned by one retrieval call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSet {
    passages: Vec<Passage>,
}

impl EvidenceSet {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self { passages }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Drop everything past the first `k` passages
    pub fn truncated(mut self, k: usize) -> Self {
        self.passages.truncate(k);
        self
    }
}

impl FromIterator<Passage> for EvidenceSet {
    fn from_iter<I: IntoIterator<Item = Passage>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The relevant subsequence of an [`EvidenceSet`], in original order
///
/// Only built by the relevance filter, so it is always a subset of the
/// evidence set of the same attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredEvidenceSet {
    passages: Vec<Passage>,
    retrieved: usize,
}

impl FilteredEvidenceSet {
    pub(crate) fn new(passages: Vec<Passage>, retrieved: usize) -> Self {
        Self {
            passages,
            retrieved,
        }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Size of the evidence set this was filtered from
    pub fn retrieved(&self) -> usize {
        self.retrieved
    }

    /// Passage contents joined with `separator`
    pub fn joined(&self, separator: &str) -> String {
        self.passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_labels() {
        assert_eq!(
            RouteDecision::from_label("vectorstore"),
            Some(RouteDecision::Vectorstore)
        );
        assert_eq!(
            RouteDecision::from_label(" Web_Search "),
            Some(RouteDecision::WebSearch)
        );
        assert_eq!(RouteDecision::from_label("database"), None);
        assert_eq!(RouteDecision::WebSearch.to_string(), "web_search");
    }

    #[test]
    fn test_route_serialization() {
        let json = serde_json::to_string(&RouteDecision::Vectorstore).unwrap();
        assert_eq!(json, r#""vectorstore""#);
    }

    #[test]
    fn test_evidence_set_truncated() {
        let set: EvidenceSet = (0..5)
            .map(|i| Passage::new(format!("doc-{}", i), "content"))
            .collect();

        let set = set.truncated(3);
        assert_eq!(set.len(), 3);
        assert_eq!(set.passages()[2].id, "doc-2");
    }

    #[test]
    fn test_filtered_joined() {
        let filtered = FilteredEvidenceSet::new(
            vec![Passage::new("a", "first"), Passage::new("b", "second")],
            4,
        );

        assert_eq!(filtered.joined("\n\n"), "first\n\nsecond");
        assert_eq!(filtered.retrieved(), 4);
    }
}
