//! Query router capability

use std::fmt::Debug;

use async_trait::async_trait;

use super::topics::TopicSnapshot;
use crate::domain::evidence::RouteDecision;
use crate::domain::{DomainError, Question};

/// Classifies a question as indexed-store or live-search material
///
/// Routing is total: implementations return one of the two decisions or an
/// error, never an abstain.
#[async_trait]
pub trait QueryRouter: Send + Sync + Debug {
    async fn route(
        &self,
        question: &Question,
        topics: &TopicSnapshot,
    ) -> Result<RouteDecision, DomainError>;

    fn router_name(&self) -> &'static str;
}
