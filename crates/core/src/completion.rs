//! Completion gateway trait — the abstraction over the text-generation
//! service.
//!
//! The service may signal a rate-limit condition distinguishable from
//! other failures, optionally carrying a server-advised retry-after
//! duration. The request pacer in `recall-providers` keys off that
//! distinction; everything else is a plain failure.

use crate::error::CompletionError;
use crate::session::{Role, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One message in a completion request: role + content, nothing more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// The completion gateway trait.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// A human-readable name for this gateway.
    fn name(&self) -> &str;

    /// Send an ordered message sequence and get the generated text back.
    async fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> std::result::Result<String, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_from_turn_drops_author() {
        let turn = Turn::user("hello", Some("user123".into()));
        let msg = ChatMessage::from(&turn);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
    }
}
