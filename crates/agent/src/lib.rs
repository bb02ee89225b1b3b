//! The Recall orchestrator: for each inbound message it decides whether
//! to respond, enriches the prompt with previously seen contexts scoped
//! to the sender, calls the completion service through the request
//! pacer, and feeds the exchange back into context storage.

pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{InboundMessage, Orchestrator, FAILURE_REPLY, RATE_LIMITED_REPLY};

#[cfg(test)]
pub(crate) mod test_helpers;
