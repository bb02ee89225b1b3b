//! Vector index gateway implementations for Recall.
//!
//! All gateways implement the `recall_core::IndexGateway` trait.

pub mod in_memory;
pub mod serverless;
pub mod vector;

pub use in_memory::InMemoryIndex;
pub use serverless::ServerlessIndex;
pub use vector::cosine_similarity;
