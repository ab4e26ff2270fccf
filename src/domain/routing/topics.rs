//! Router topic configuration
//!
//! Topics describe what the indexed store covers. They are held behind a
//! copy-on-update registry: each run takes a snapshot at start, and updates
//! publish a new snapshot without touching the ones already handed out.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Topics covered by the indexed store out of the box
pub const DEFAULT_TOPICS: &[&str] = &[
    "Finance and real estate",
    "Library and research topics",
    "Biology and microbiology",
    "Literature and writing",
    "Movies and entertainment",
    "Animals and nature",
    "History and geography",
    "Astronomy",
];

/// A versioned, immutable topic list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSnapshot {
    pub version: u64,
    pub topics: Vec<String>,
}

impl TopicSnapshot {
    /// Topics rendered as a bullet list for prompts
    pub fn as_bullets(&self) -> String {
        self.topics
            .iter()
            .map(|t| format!("- {}", t))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Holds the current topic snapshot and publishes replacements
#[derive(Debug)]
pub struct TopicRegistry {
    current: RwLock<Arc<TopicSnapshot>>,
}

impl TopicRegistry {
    pub fn new(topics: Vec<String>) -> Result<Self, DomainError> {
        let topics = normalize(topics)?;

        Ok(Self {
            current: RwLock::new(Arc::new(TopicSnapshot { version: 1, topics })),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            current: RwLock::new(Arc::new(TopicSnapshot {
                version: 1,
                topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            })),
        }
    }

    /// The snapshot in effect right now
    pub fn snapshot(&self) -> Arc<TopicSnapshot> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the topic list, returning the new snapshot
    pub fn update(&self, topics: Vec<String>) -> Result<Arc<TopicSnapshot>, DomainError> {
        let topics = normalize(topics)?;

        let mut guard = self
            .current
            .write()
            .map_err(|_| DomainError::internal("Topic registry lock poisoned"))?;

        let next = Arc::new(TopicSnapshot {
            version: guard.version + 1,
            topics,
        });
        *guard = next.clone();

        tracing::info!(
            version = next.version,
            topics = next.topics.len(),
            "Router topics updated"
        );

        Ok(next)
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn normalize(topics: Vec<String>) -> Result<Vec<String>, DomainError> {
    let topics: Vec<String> = topics
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if topics.is_empty() {
        return Err(DomainError::validation(
            "Router topic list must contain at least one topic",
        ));
    }

    Ok(topics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_topics() {
        let registry = TopicRegistry::with_defaults();
        let snapshot = registry.snapshot();

        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.topics.len(), DEFAULT_TOPICS.len());
        assert!(snapshot.as_bullets().starts_with("- Finance and real estate"));
    }

    #[test]
    fn test_update_does_not_touch_existing_snapshot() {
        let registry = TopicRegistry::new(vec!["Astronomy".to_string()]).unwrap();
        let before = registry.snapshot();

        let after = registry
            .update(vec!["Rust programming".to_string(), "  ".to_string()])
            .unwrap();

        assert_eq!(before.version, 1);
        assert_eq!(before.topics, vec!["Astronomy".to_string()]);
        assert_eq!(after.version, 2);
        assert_eq!(after.topics, vec!["Rust programming".to_string()]);
        assert_eq!(registry.snapshot().version, 2);
    }

    #[test]
    fn test_update_rejects_empty_list() {
        let registry = TopicRegistry::with_defaults();

        assert!(registry.update(vec![" ".to_string()]).is_err());
        assert_eq!(registry.snapshot().version, 1);
    }
}
