//! Routing domain - topic configuration and the router capability

mod router;
mod topics;

pub use router::QueryRouter;
pub use topics::{TopicRegistry, TopicSnapshot, DEFAULT_TOPICS};

#[cfg(test)]
pub use router::mock::MockQueryRouter;
