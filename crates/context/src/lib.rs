//! Context system for Recall: the store that turns text operations into
//! vector operations, the manager that layers owner/topic scoping on
//! top, and the file-backed authoritative record of full payloads.

pub mod manager;
pub mod record;
pub mod store;

pub use manager::ContextManager;
pub use record::ContextRecord;
pub use store::{ContextStore, WriteOutcome};
