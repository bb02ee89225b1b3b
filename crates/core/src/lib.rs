//! # Recall Core
//!
//! Domain types, gateway traits, and error definitions for the Recall
//! conversation runtime. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (embedding model, vector index, completion
//! service) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub gateways
//! - Clean dependency graph (all crates depend inward on core)

pub mod completion;
pub mod context;
pub mod embedding;
pub mod error;
pub mod index;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use completion::{ChatMessage, CompletionGateway};
pub use context::{
    Context, ContextAttributes, ContextId, ContextSummary, GENERAL_TOPIC, RetrievedContext,
};
pub use embedding::EmbeddingGateway;
pub use error::{Error, Result};
pub use index::{DistanceMetric, IndexGateway, IndexMatch, IndexRecord, IndexSpec};
pub use session::{Role, SessionId, Turn};
