//! Session manager — in-memory conversation state keyed by session id.
//!
//! Each session holds an append-only history of turns plus an auto-reply
//! flag. Sessions materialize lazily on first mutation; read paths never
//! create state, so probing an unknown session is free of side effects.

use recall_core::session::{SessionId, Turn};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// State held per session.
#[derive(Debug, Default)]
struct SessionState {
    history: Vec<Turn>,
    auto_reply: bool,
}

/// Tracks every active session. Cheap to share behind an `Arc`.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SessionState>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Append a turn to a session's history, creating the session if it
    /// does not exist yet.
    pub async fn append(&self, id: &SessionId, turn: Turn) {
        let mut sessions = self.sessions.write().await;
        let state = sessions.entry(id.clone()).or_default();
        state.history.push(turn);
        debug!(session = %id, turns = state.history.len(), "Turn appended");
    }

    /// The session's history in insertion order. Unknown sessions yield
    /// an empty history and are not created.
    pub async fn history(&self, id: &SessionId) -> Vec<Turn> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    /// Clear a session's history. The auto-reply flag survives the reset.
    /// A no-op for unknown sessions.
    pub async fn reset(&self, id: &SessionId) {
        if let Some(state) = self.sessions.write().await.get_mut(id) {
            state.history.clear();
            debug!(session = %id, "Session history reset");
        }
    }

    /// Set the auto-reply flag, creating the session if needed.
    pub async fn set_auto_reply(&self, id: &SessionId, enabled: bool) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(id.clone()).or_default().auto_reply = enabled;
        debug!(session = %id, enabled, "Auto-reply flag set");
    }

    /// Whether auto-reply is enabled. Defaults to `false`, including for
    /// sessions that have never been seen.
    pub async fn is_auto_reply(&self, id: &SessionId) -> bool {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.auto_reply)
            .unwrap_or(false)
    }

    /// Number of sessions currently tracked.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
