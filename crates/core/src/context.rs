//! Context domain types.
//!
//! A Context is a unit of stored knowledge: a short text fragment tagged
//! by owner and topic, with a vector embedding computed once at ingestion.
//! Contexts flow one way: ingested → indexed → retrieved to enrich prompts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The sentinel topic that matches any stored topic at query time.
pub const GENERAL_TOPIC: &str = "general";

/// Unique identifier for a stored context.
///
/// Generated at ingestion time as `{owner_id}_{uuid}` so ids stay unique
/// across tenants and are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub String);

impl ContextId {
    /// Generate a fresh id scoped by owner.
    pub fn generate(owner_id: &str) -> Self {
        Self(format!("{}_{}", owner_id, Uuid::new_v4().simple()))
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The attributes stored alongside a context's vector in the index.
///
/// Owner, topic, timestamp, and text are fixed well-known fields — the
/// scoping filter depends on them and must stay type-safe. Everything
/// else the caller wants to attach goes into `extra`.
///
/// `text` is carried here as a searchable snapshot so a query hit is
/// usable even if the authoritative record has diverged from the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextAttributes {
    /// The tenant/user this context belongs to.
    pub owner_id: String,

    /// Free-form category label. Immutable once set, like `owner_id`.
    pub topic: String,

    /// Snapshot of the original fragment.
    pub text: String,

    /// Creation time (UTC). Immutable.
    pub timestamp: DateTime<Utc>,

    /// Caller-supplied extension attributes (role, kind, ...).
    /// Immutable once written.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContextAttributes {
    /// Whether this context is visible to a query scoped to the given
    /// owner and topic.
    ///
    /// The topic sentinel `"general"` matches any stored topic; any other
    /// query topic must equal the stored one exactly.
    pub fn in_scope(&self, owner_id: &str, topic: &str) -> bool {
        self.owner_id == owner_id && (topic == GENERAL_TOPIC || self.topic == topic)
    }
}

/// A stored context: the authoritative full payload.
///
/// The index holds the vector plus `ContextAttributes`; this struct is
/// what the authoritative local record keeps. The `(owner_id, topic)`
/// pair is immutable — updates create a new Context, never mutate one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Unique ID, generated at ingestion, never reused.
    pub id: ContextId,

    /// Owner/topic/text/timestamp plus open extension attributes.
    pub attributes: ContextAttributes,
}

impl Context {
    /// Create a new context with a freshly generated id and timestamp.
    pub fn new(
        owner_id: impl Into<String>,
        text: impl Into<String>,
        topic: impl Into<String>,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let owner_id = owner_id.into();
        let id = ContextId::generate(&owner_id);
        Self {
            id,
            attributes: ContextAttributes {
                owner_id,
                topic: topic.into(),
                text: text.into(),
                timestamp: Utc::now(),
                extra,
            },
        }
    }
}

/// A context returned from a scoped relevance query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// The id of the matching context.
    pub id: ContextId,

    /// The fragment text (from the authoritative record, or the index
    /// snapshot if the record has diverged).
    pub text: String,

    /// Similarity score reported by the index.
    pub score: f32,
}

/// Diagnostic summary of the tracked contexts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSummary {
    /// Number of contexts in the authoritative record.
    pub total_contexts: usize,

    /// All tracked ids.
    pub context_ids: Vec<ContextId>,

    /// Timestamp of the most recently ingested context, if any.
    pub latest_timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_owner_scoped_and_unique() {
        let a = ContextId::generate("alice");
        let b = ContextId::generate("alice");
        assert!(a.as_str().starts_with("alice_"));
        assert_ne!(a, b);
    }

    #[test]
    fn scope_requires_matching_owner() {
        let ctx = Context::new("alice", "fact", "house", serde_json::Map::new());
        assert!(ctx.attributes.in_scope("alice", "house"));
        assert!(!ctx.attributes.in_scope("bob", "house"));
    }

    #[test]
    fn general_topic_matches_any_stored_topic() {
        let ctx = Context::new("alice", "fact", "house", serde_json::Map::new());
        assert!(ctx.attributes.in_scope("alice", GENERAL_TOPIC));
        assert!(!ctx.attributes.in_scope("alice", "work"));
    }

    #[test]
    fn context_serialization_roundtrip() {
        let mut extra = serde_json::Map::new();
        extra.insert("kind".into(), serde_json::json!("note"));
        let ctx = Context::new("alice", "The kitchen is north.", "house", extra);

        let json = serde_json::to_string(&ctx).unwrap();
        let parsed: Context = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, ctx.id);
        assert_eq!(parsed.attributes.text, "The kitchen is north.");
        assert_eq!(parsed.attributes.extra["kind"], "note");
    }
}
