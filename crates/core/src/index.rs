//! Index gateway trait — the abstraction over the external vector index.
//!
//! The index is a black-box put/query service: vectors partitioned by a
//! namespace string, distance metric fixed at index-creation time. The
//! stored attributes travel with each vector and come back with every
//! match — scoping filters run on them client-side, after retrieval.

use crate::context::ContextAttributes;
use crate::error::IndexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Distance metric, fixed when the index is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Dotproduct,
    Euclidean,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Dotproduct => "dotproduct",
            DistanceMetric::Euclidean => "euclidean",
        }
    }
}

/// Everything needed to provision an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSpec {
    /// The index name.
    pub name: String,

    /// Vector dimensionality (must match the embedding gateway).
    pub dimension: usize,

    /// Distance metric.
    pub metric: DistanceMetric,
}

/// A vector plus its searchable attributes, keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub attributes: ContextAttributes,
}

/// A ranked match returned from a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,

    /// Similarity score under the index's metric (higher = closer for
    /// cosine/dotproduct).
    pub score: f32,

    /// The attributes stored with the vector.
    pub attributes: ContextAttributes,
}

/// The index gateway trait.
///
/// Implementations: serverless HTTP index, in-memory cosine scan.
#[async_trait]
pub trait IndexGateway: Send + Sync {
    /// A human-readable name for this gateway (e.g., "serverless", "in_memory").
    fn name(&self) -> &str;

    /// Create the index if it does not exist.
    ///
    /// Idempotent: an "already exists" response (including a conflict
    /// status) is success. Any other failure is fatal to startup.
    async fn ensure_index(&self, spec: &IndexSpec) -> std::result::Result<(), IndexError>;

    /// Write a vector + attributes keyed by id into the configured
    /// namespace. Last write wins for concurrent upserts of the same id.
    async fn upsert(&self, record: IndexRecord) -> std::result::Result<(), IndexError>;

    /// Return the top-`k` nearest matches to the query vector.
    async fn query(
        &self,
        vector: &[f32],
        k: usize,
    ) -> std::result::Result<Vec<IndexMatch>, IndexError>;

    /// Delete a vector by id. Absence of the target is success.
    async fn delete(&self, id: &str) -> std::result::Result<(), IndexError>;

    /// Delete every vector in the configured namespace. A missing
    /// namespace is success.
    async fn clear_namespace(&self) -> std::result::Result<(), IndexError>;
}
