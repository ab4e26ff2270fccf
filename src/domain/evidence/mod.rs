//! Evidence domain - passages, evidence sets and the source capability

mod passage;
mod source;

pub use passage::{EvidenceSet, FilteredEvidenceSet, Passage, RouteDecision};
pub use source::{EvidenceSource, EvidenceSources, RetrievalRequest};

#[cfg(test)]
pub use source::mock::MockEvidenceSource;
