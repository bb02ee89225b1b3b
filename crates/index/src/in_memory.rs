//! In-memory index — exact cosine scan over a Vec.
//!
//! Useful for tests and keyless local runs where no external vector
//! index is configured. Semantics match the serverless gateway: last
//! write wins per id, deletes of unknown ids succeed, clearing an
//! already-empty namespace succeeds.

use async_trait::async_trait;
use recall_core::error::IndexError;
use recall_core::index::{IndexGateway, IndexMatch, IndexRecord, IndexSpec};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::vector::cosine_similarity;

/// An in-memory index that stores records in a Vec.
pub struct InMemoryIndex {
    records: Arc<RwLock<Vec<IndexRecord>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Number of stored records (for diagnostics and tests).
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexGateway for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn ensure_index(&self, _spec: &IndexSpec) -> Result<(), IndexError> {
        // Nothing to provision; repeated calls are trivially idempotent.
        Ok(())
    }

    async fn upsert(&self, record: IndexRecord) -> Result<(), IndexError> {
        let mut records = self.records.write().await;
        // Last write wins
        records.retain(|r| r.id != record.id);
        records.push(record);
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>, IndexError> {
        let records = self.records.read().await;

        let mut matches: Vec<IndexMatch> = records
            .iter()
            .map(|r| IndexMatch {
                id: r.id.clone(),
                score: cosine_similarity(&r.vector, vector),
                attributes: r.attributes.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);

        Ok(matches)
    }

    async fn delete(&self, id: &str) -> Result<(), IndexError> {
        self.records.write().await.retain(|r| r.id != id);
        Ok(())
    }

    async fn clear_namespace(&self) -> Result<(), IndexError> {
        self.records.write().await.clear();
        Ok(())
    }
}
