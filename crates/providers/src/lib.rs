//! Completion and embedding gateway implementations for Recall,
//! plus the request pacer that wraps every outbound completion call.
//!
//! All gateways implement the `recall_core` traits.

pub mod openai_compat;
pub mod pacer;

pub use openai_compat::OpenAiCompatClient;
pub use pacer::RequestPacer;
