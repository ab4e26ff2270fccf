//! Generation domain - answer generation and query rewriting

mod generator;
mod rewriter;

pub use generator::Generator;
pub use rewriter::QueryRewriter;

#[cfg(test)]
pub use generator::mock::MockGenerator;
#[cfg(test)]
pub use rewriter::mock::MockQueryRewriter;
