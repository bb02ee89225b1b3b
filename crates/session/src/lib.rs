//! Session state for Recall: per-conversation turn history with an
//! auto-reply flag, and the persisted approval list that gates which
//! chats the agent will serve.

pub mod approvals;
pub mod manager;

pub use approvals::{ApprovalList, ApprovalOutcome};
pub use manager::SessionManager;
