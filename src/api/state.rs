//! Application state for shared services

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::engine::AdaptiveEngine;
use crate::domain::routing::TopicRegistry;
use crate::infrastructure::engine::BatchRunner;
use crate::infrastructure::evidence::InMemoryIndex;

/// Shared handles for request handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn AdaptiveEngine>,
    pub topics: Arc<TopicRegistry>,
    pub index: Arc<InMemoryIndex>,
    pub batch: BatchRunner,
    /// Cancelled on shutdown; every run gets a child token
    pub shutdown: CancellationToken,
}
