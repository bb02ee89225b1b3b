//! Context manager — scoped ingestion and retrieval semantics layered
//! on the context store.
//!
//! Scoping is correctness-critical and happens strictly *after*
//! retrieval, on the attributes returned with each match: the
//! similarity search itself is tenant-oblivious and `k` caps the
//! candidate set before filtering, so fewer than `k` results may
//! survive scoping. A crowded namespace can therefore starve a
//! tenant's own relevant results before the filter trims the rest —
//! a known precision/recall tradeoff, not a bug.

use crate::record::ContextRecord;
use crate::store::{ContextStore, WriteOutcome};
use recall_core::context::{Context, ContextId, ContextSummary, RetrievedContext};
use recall_core::error::RecordError;
use tracing::{debug, info};

/// Owns the authoritative text/metadata record and drives the store.
pub struct ContextManager {
    store: ContextStore,
    record: ContextRecord,
}

impl ContextManager {
    pub fn new(store: ContextStore, record: ContextRecord) -> Self {
        Self { store, record }
    }

    /// Ingest a raw text fragment for an owner under a topic.
    ///
    /// Generates a fresh owner-scoped id, stamps the timestamp, merges
    /// caller extras with the fixed attributes, records the full payload
    /// in the authoritative record, and upserts into the index. An index
    /// write failure degrades silently (logged); a record write failure
    /// propagates, since the record is the source of truth.
    pub async fn ingest(
        &self,
        owner_id: &str,
        text: &str,
        topic: &str,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ContextId, RecordError> {
        let context = Context::new(owner_id, text, topic, extra);
        let id = context.id.clone();
        let attributes = context.attributes.clone();

        self.record.insert(context).await?;
        let outcome = self.store.upsert(id.as_str(), attributes).await;

        if outcome == WriteOutcome::Degraded {
            debug!(id = %id, "Context recorded but not indexed");
        } else {
            debug!(id = %id, owner_id, topic, "Context ingested");
        }

        Ok(id)
    }

    /// Return the texts most relevant to `query_text`, scoped to the
    /// owner and topic.
    ///
    /// `k` is a pre-filter cap on the similarity candidates. Results keep
    /// the index's ranking order. When an index hit has no entry in the
    /// authoritative record (a write degraded earlier), the text snapshot
    /// stored with the vector is used instead of dropping the hit.
    pub async fn query(
        &self,
        owner_id: &str,
        query_text: &str,
        topic: &str,
        k: usize,
    ) -> Vec<RetrievedContext> {
        let matches = self.store.query(query_text, k).await;

        let mut results = Vec::new();
        for m in matches {
            if !m.attributes.in_scope(owner_id, topic) {
                continue;
            }

            let text = match self.record.get(&m.id).await {
                Some(ctx) => ctx.attributes.text,
                // Record and index diverged; fall back to the snapshot.
                None => m.attributes.text,
            };

            results.push(RetrievedContext {
                id: ContextId::from(&m.id),
                text,
                score: m.score,
            });
        }

        debug!(owner_id, topic, hits = results.len(), "Scoped context query");
        results
    }

    /// Delete a context: authoritative record first, then the index.
    pub async fn delete(&self, id: &ContextId) -> Result<(), RecordError> {
        self.record.remove(id).await?;
        self.store.delete(id.as_str()).await;
        Ok(())
    }

    /// Clear everything: the record and the index namespace.
    pub async fn clear(&self) -> Result<(), RecordError> {
        self.record.clear().await?;
        self.store.clear().await;
        info!("Context record and namespace cleared");
        Ok(())
    }

    /// Diagnostic summary of the tracked contexts.
    pub async fn summary(&self) -> ContextSummary {
        ContextSummary {
            total_contexts: self.record.count().await,
            context_ids: self.record.ids().await,
            latest_timestamp: self.record.latest_timestamp().await,
        }
    }
}
