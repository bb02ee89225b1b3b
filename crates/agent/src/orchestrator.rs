//! The orchestrator — composition root for one serving process.
//!
//! Ties the session manager, context manager, completion gateway, and
//! request pacer together into a single `handle` entry point that the
//! channel adapter (CLI, bot, HTTP route) calls per inbound message.
//!
//! Gating comes first and is a pure filter: a message that is neither an
//! explicit target nor inside an auto-reply session is dropped forever,
//! never buffered. Retrieval failures never surface to the user; only
//! completion failures do, as fixed user-facing strings.

use crate::prompt;
use recall_core::completion::CompletionGateway;
use recall_core::context::GENERAL_TOPIC;
use recall_core::error::{CompletionError, Error};
use recall_core::session::{SessionId, Turn};
use recall_context::ContextManager;
use recall_providers::RequestPacer;
use recall_session::SessionManager;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What the user sees when retries against a rate-limited completion
/// service are exhausted.
pub const RATE_LIMITED_REPLY: &str =
    "I'm being rate limited right now. Please try again in a little while.";

/// What the user sees on any other completion failure.
pub const FAILURE_REPLY: &str =
    "Something went wrong while generating a reply. Please try again.";

/// An inbound message as delivered by a channel adapter.
///
/// The adapter owns channel-specific concerns (authentication, media,
/// markup, command parsing); by the time a message reaches the
/// orchestrator it is plain text plus identity.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// The channel/chat the message arrived on.
    pub channel_id: String,

    /// Sub-thread within the channel, when the platform has threads.
    pub thread_id: Option<String>,

    /// Who sent it. Contexts are scoped to this id.
    pub sender_id: String,

    /// The message text.
    pub text: String,

    /// Whether the message explicitly targets the system (direct
    /// mention, reply, explicit invocation). Bypasses the auto-reply
    /// gate.
    pub explicit_target: bool,
}

impl InboundMessage {
    /// The session this message belongs to.
    pub fn session_id(&self) -> SessionId {
        SessionId::compose(&self.channel_id, self.thread_id.as_deref())
    }
}

/// Drives one inbound message through gating, retrieval, completion,
/// and write-back.
pub struct Orchestrator {
    sessions: Arc<SessionManager>,
    contexts: Arc<ContextManager>,
    completion: Arc<dyn CompletionGateway>,
    pacer: Arc<RequestPacer>,
    max_retries: u32,
    retrieval_k: usize,
}

impl Orchestrator {
    pub fn new(
        sessions: Arc<SessionManager>,
        contexts: Arc<ContextManager>,
        completion: Arc<dyn CompletionGateway>,
        pacer: Arc<RequestPacer>,
        max_retries: u32,
        retrieval_k: usize,
    ) -> Self {
        Self {
            sessions,
            contexts,
            completion,
            pacer,
            max_retries,
            retrieval_k,
        }
    }

    /// Handle one inbound message.
    ///
    /// Returns `Ok(None)` when the message is filtered out (auto-reply
    /// off and not an explicit target), `Ok(Some(text))` with the reply
    /// or a fixed user-facing failure string otherwise. Only a
    /// misconfigured completion gateway produces `Err` — that is a
    /// deployment problem, not something to phrase as a chat reply.
    pub async fn handle(&self, message: InboundMessage) -> Result<Option<String>, Error> {
        let session_id = message.session_id();

        if !message.explicit_target && !self.sessions.is_auto_reply(&session_id).await {
            debug!(session = %session_id, "Message filtered: auto-reply off, not a target");
            return Ok(None);
        }

        self.sessions
            .append(
                &session_id,
                Turn::user(&message.text, Some(message.sender_id.clone())),
            )
            .await;

        let retrieved = self
            .contexts
            .query(&message.sender_id, &message.text, GENERAL_TOPIC, self.retrieval_k)
            .await;

        let history = self.sessions.history(&session_id).await;
        let messages = prompt::build_messages(&history, &retrieved);

        let reply = match self
            .pacer
            .call_with_retry(self.max_retries, || self.completion.complete(&messages))
            .await
        {
            Ok(reply) => reply,
            Err(e @ CompletionError::NotConfigured(_)) => return Err(Error::Completion(e)),
            Err(CompletionError::RateLimited { .. }) => {
                warn!(session = %session_id, "Rate-limit retries exhausted");
                return Ok(Some(RATE_LIMITED_REPLY.to_string()));
            }
            Err(e) => {
                error!(session = %session_id, error = %e, "Completion failed");
                return Ok(Some(FAILURE_REPLY.to_string()));
            }
        };

        self.sessions
            .append(&session_id, Turn::assistant(&reply))
            .await;

        self.remember_exchange(&message, &session_id, &reply).await;

        info!(session = %session_id, retrieved = retrieved.len(), "Reply generated");
        Ok(Some(reply))
    }

    /// Feed both sides of the exchange back into context storage so they
    /// are retrievable later. Best-effort: a failed write never unwinds
    /// a reply that was already generated.
    async fn remember_exchange(
        &self,
        message: &InboundMessage,
        session_id: &SessionId,
        reply: &str,
    ) {
        let mut extra = serde_json::Map::new();
        extra.insert("session".into(), serde_json::json!(session_id.as_str()));

        let mut user_extra = extra.clone();
        user_extra.insert("kind".into(), serde_json::json!("message"));
        if let Err(e) = self
            .contexts
            .ingest(&message.sender_id, &message.text, GENERAL_TOPIC, user_extra)
            .await
        {
            warn!(error = %e, "Could not store user message as context");
        }

        extra.insert("kind".into(), serde_json::json!("response"));
        if let Err(e) = self
            .contexts
            .ingest(&message.sender_id, reply, GENERAL_TOPIC, extra)
            .await
        {
            warn!(error = %e, "Could not store reply as context");
        }
    }

    /// Toggle auto-reply for a session. Exposed for the channel
    /// adapter's start/stop style controls.
    pub async fn set_auto_reply(&self, session_id: &SessionId, enabled: bool) {
        self.sessions.set_auto_reply(session_id, enabled).await;
    }

    /// Clear a session's history, keeping its auto-reply flag.
    pub async fn reset_session(&self, session_id: &SessionId) {
        self.sessions.reset(session_id).await;
    }

    /// The session manager backing this orchestrator.
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// The context manager backing this orchestrator.
    pub fn contexts(&self) -> &Arc<ContextManager> {
        &self.contexts
    }
}
