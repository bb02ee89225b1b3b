//! Embedding gateway trait — the abstraction over the embedding model.
//!
//! The model itself is a black box: text in, fixed-dimensionality vector
//! out. Implementations live in `recall-providers`.

use crate::error::EmbeddingError;
use async_trait::async_trait;

/// The embedding gateway trait.
///
/// Embeddings are computed once at ingestion and once per query; they are
/// never recomputed for a stored context unless it is re-ingested.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// A human-readable name for this gateway (e.g., "openai", "fixed").
    fn name(&self) -> &str;

    /// The fixed dimensionality of produced vectors (e.g., 384).
    fn dimension(&self) -> usize;

    /// Embed a text fragment into a semantic vector.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError>;
}
