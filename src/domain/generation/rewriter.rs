//! Query rewriter capability

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::{DomainError, Question};

/// Reformulates a question to improve retrieval on a retry
///
/// Not idempotent: repeated calls may return different phrasings.
#[async_trait]
pub trait QueryRewriter: Send + Sync + Debug {
    async fn rewrite(&self, question: &Question) -> Result<Question, DomainError>;

    fn rewriter_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    /// Mock rewriter appending a revision marker to the question
    #[derive(Debug, Default)]
    pub struct MockQueryRewriter {
        error: Option<DomainError>,
        cancel_on_call: Option<CancellationToken>,
        calls: AtomicUsize,
    }

    impl MockQueryRewriter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_error(mut self, error: DomainError) -> Self {
            self.error = Some(error);
            self
        }

        /// Cancel `token` while rewriting, as if the caller gave up mid-run
        pub fn cancelling(mut self, token: CancellationToken) -> Self {
            self.cancel_on_call = Some(token);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryRewriter for MockQueryRewriter {
        async fn rewrite(&self, question: &Question) -> Result<Question, DomainError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

            if let Some(ref token) = self.cancel_on_call {
                token.cancel();
            }

            if let Some(ref error) = self.error {
                return Err(error.clone());
            }

            Question::new(format!("{} (rev {})", question, n))
        }

        fn rewriter_name(&self) -> &'static str {
            "mock"
        }
    }
}
