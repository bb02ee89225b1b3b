//! Context store — translates text operations into vector operations
//! against the external index, with index provisioning.
//!
//! Every mutating operation here is best-effort and non-throwing:
//! retrieval is an enhancement of the conversation flow, not a
//! correctness requirement, so a missing context degrades gracefully
//! instead of breaking the chat. The one exception is `ensure_index`,
//! whose failure is fatal to startup.

use recall_core::context::ContextAttributes;
use recall_core::embedding::EmbeddingGateway;
use recall_core::error::IndexError;
use recall_core::index::{IndexGateway, IndexMatch, IndexRecord, IndexSpec};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a best-effort write.
///
/// `Degraded` means the operation failed downstream, was logged, and the
/// flow should continue — callers branch on it without an error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write reached the index.
    Stored,
    /// The write was lost; details are in the log.
    Degraded,
}

impl WriteOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, WriteOutcome::Degraded)
    }
}

/// Combines the embedding and index gateways into a single unit of work:
/// embed-then-upsert and embed-then-query.
pub struct ContextStore {
    embedding: Arc<dyn EmbeddingGateway>,
    index: Arc<dyn IndexGateway>,
}

impl ContextStore {
    pub fn new(embedding: Arc<dyn EmbeddingGateway>, index: Arc<dyn IndexGateway>) -> Self {
        Self { embedding, index }
    }

    /// Provision the index if absent. Idempotent; "already exists" is
    /// success. Any other failure propagates and is fatal to startup.
    pub async fn ensure_index(&self, spec: &IndexSpec) -> Result<(), IndexError> {
        self.index.ensure_index(spec).await
    }

    /// Embed the attribute text and write vector + attributes keyed by
    /// `id` into the index. Last write wins for a given id.
    ///
    /// Non-fatal: a failed embed or upsert is logged and reported as
    /// `Degraded`, never an error.
    pub async fn upsert(&self, id: &str, attributes: ContextAttributes) -> WriteOutcome {
        let vector = match self.embedding.embed(&attributes.text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(id, error = %e, "Could not embed context, write degraded");
                return WriteOutcome::Degraded;
            }
        };

        let record = IndexRecord {
            id: id.to_string(),
            vector,
            attributes,
        };

        match self.index.upsert(record).await {
            Ok(()) => {
                debug!(id, "Context indexed");
                WriteOutcome::Stored
            }
            Err(e) => {
                warn!(id, error = %e, "Could not index context, write degraded");
                WriteOutcome::Degraded
            }
        }
    }

    /// Embed the query text and return the top-`k` nearest matches.
    ///
    /// Returns an empty list on any downstream failure rather than
    /// propagating — the caller proceeds with no extra context.
    pub async fn query(&self, text: &str, k: usize) -> Vec<IndexMatch> {
        let vector = match self.embedding.embed(text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Could not embed query, returning no matches");
                return Vec::new();
            }
        };

        match self.index.query(&vector, k).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "Index query failed, returning no matches");
                Vec::new()
            }
        }
    }

    /// Best-effort delete. Absence of the target is success; failures
    /// are logged and swallowed.
    pub async fn delete(&self, id: &str) {
        if let Err(e) = self.index.delete(id).await {
            warn!(id, error = %e, "Could not delete context from index");
        }
    }

    /// Best-effort namespace clear. A missing namespace is success;
    /// failures are logged and swallowed.
    pub async fn clear(&self) {
        if let Err(e) = self.index.clear_namespace().await {
            warn!(error = %e, "Could not clear index namespace");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use recall_core::error::EmbeddingError;
    use recall_index::InMemoryIndex;

    /// Deterministic embedding: folds bytes into a small fixed vector so
    /// equal texts embed equally and tests need no network.
    struct StubEmbedding;

    #[async_trait]
    impl EmbeddingGateway for StubEmbedding {
        fn name(&self) -> &str {
            "stub"
        }

        fn dimension(&self) -> usize {
            8
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let mut v = vec![0.0f32; 8];
            for (i, b) in text.bytes().enumerate() {
                v[i % 8] += b as f32;
            }
            Ok(v)
        }
    }

    /// An embedding gateway that always fails.
    struct FailingEmbedding;

    #[async_trait]
    impl EmbeddingGateway for FailingEmbedding {
        fn name(&self) -> &str {
            "failing"
        }

        fn dimension(&self) -> usize {
            8
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Network("no route to host".into()))
        }
    }

    fn attributes(owner: &str, text: &str) -> ContextAttributes {
        ContextAttributes {
            owner_id: owner.into(),
            topic: "general".into(),
            text: text.into(),
            timestamp: Utc::now(),
            extra: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn upsert_then_query_round_trips() {
        let store = ContextStore::new(Arc::new(StubEmbedding), Arc::new(InMemoryIndex::new()));

        let outcome = store.upsert("id1", attributes("alice", "hello world")).await;
        assert_eq!(outcome, WriteOutcome::Stored);

        let matches = store.query("hello world", 5).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "id1");
        assert_eq!(matches[0].attributes.text, "hello world");
    }

    #[tokio::test]
    async fn embed_failure_degrades_write() {
        let store = ContextStore::new(Arc::new(FailingEmbedding), Arc::new(InMemoryIndex::new()));
        let outcome = store.upsert("id1", attributes("alice", "lost")).await;
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn embed_failure_yields_empty_query() {
        let store = ContextStore::new(Arc::new(FailingEmbedding), Arc::new(InMemoryIndex::new()));
        let matches = store.query("anything", 5).await;
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn delete_and_clear_are_best_effort() {
        let store = ContextStore::new(Arc::new(StubEmbedding), Arc::new(InMemoryIndex::new()));
        // Nothing stored — neither call panics or errors
        store.delete("ghost").await;
        store.clear().await;
        store.clear().await;
    }
}
