//! In-memory indexed store

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::evidence::{EvidenceSet, EvidenceSource, Passage, RetrievalRequest};
use crate::domain::DomainError;

/// Indexed store over passages held in memory
///
/// Ranks by the share of query terms found in each passage. Passages with no
/// overlap are never returned; ties keep insertion order.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    entries: RwLock<Vec<IndexedPassage>>,
}

#[derive(Debug, Clone)]
struct IndexedPassage {
    passage: Passage,
    terms: HashSet<String>,
}

#[derive(Debug, Deserialize)]
struct CorpusEntry {
    id: String,
    content: String,
    #[serde(default)]
    source: Option<String>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_passages(&self, passages: Vec<Passage>) -> usize {
        let mut entries = self.entries.write().await;
        let count = passages.len();

        for passage in passages {
            let terms = terms(&passage.content);
            entries.push(IndexedPassage { passage, terms });
        }

        count
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Build an index from a JSON array of `{id, content, source?}` objects
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!("Cannot read corpus {}: {}", path.display(), e))
        })?;

        let index = Self::from_json(&raw)?;
        info!(path = %path.display(), passages = index.len().await, "Loaded corpus");
        Ok(index)
    }

    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let corpus: Vec<CorpusEntry> = serde_json::from_str(raw)
            .map_err(|e| DomainError::validation(format!("Invalid corpus JSON: {}", e)))?;

        let entries = corpus
            .into_iter()
            .map(|entry| {
                let mut passage = Passage::new(entry.id, entry.content);
                if let Some(source) = entry.source {
                    passage = passage.with_source(source);
                }
                let terms = terms(&passage.content);
                IndexedPassage { passage, terms }
            })
            .collect();

        Ok(Self {
            entries: RwLock::new(entries),
        })
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(|t| t.to_lowercase())
        .collect()
}

#[async_trait]
impl EvidenceSource for InMemoryIndex {
    async fn retrieve(&self, request: RetrievalRequest) -> Result<EvidenceSet, DomainError> {
        let query_terms = terms(request.question.as_str());
        if query_terms.is_empty() || request.k == 0 {
            return Ok(EvidenceSet::empty());
        }

        let entries = self.entries.read().await;

        let mut scored: Vec<(f32, &IndexedPassage)> = entries
            .iter()
            .filter_map(|entry| {
                let hits = query_terms.intersection(&entry.terms).count();
                (hits > 0).then(|| (hits as f32 / query_terms.len() as f32, entry))
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let set: EvidenceSet = scored
            .into_iter()
            .take(request.k)
            .map(|(score, entry)| entry.passage.clone().with_score(score))
            .collect();

        debug!(k = request.k, returned = set.len(), "In-memory retrieval");
        Ok(set)
    }

    fn source_name(&self) -> &'static str {
        "in_memory"
    }
}
