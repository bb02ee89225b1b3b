//! Session domain types.
//!
//! A session is the ongoing exchange on one channel (optionally one
//! sub-thread), holding an append-only history of turns and an
//! independently toggled auto-reply flag.

use serde::{Deserialize, Serialize};

/// Unique identifier for a conversation session.
///
/// Composed deterministically from the primary channel id and an optional
/// sub-thread id: the same inputs always yield the same session id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Compose a session id from a channel id and optional thread id.
    pub fn compose(primary_id: &str, sub_id: Option<&str>) -> Self {
        match sub_id {
            Some(sub) => Self(format!("{primary_id}:{sub}")),
            None => Self(primary_id.to_string()),
        }
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The generated response
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single turn in a session's history.
///
/// History is append-only and order-significant: turns are replayed
/// verbatim, in insertion order, as prompt context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: Role,

    /// The text content.
    pub content: String,

    /// The author id, when the channel provides one (user turns only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>, author_id: Option<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            author_id,
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            author_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_is_deterministic() {
        let a = SessionId::compose("chat42", Some("thread7"));
        let b = SessionId::compose("chat42", Some("thread7"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "chat42:thread7");
    }

    #[test]
    fn compose_without_thread() {
        let id = SessionId::compose("chat42", None);
        assert_eq!(id.as_str(), "chat42");
    }

    #[test]
    fn threads_get_distinct_sessions() {
        let a = SessionId::compose("chat42", Some("t1"));
        let b = SessionId::compose("chat42", Some("t2"));
        assert_ne!(a, b);
    }

    #[test]
    fn turn_roles_serialize_lowercase() {
        let turn = Turn::assistant("hello");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
    }
}
