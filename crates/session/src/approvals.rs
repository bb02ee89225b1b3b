//! Chat approval gating — which conversations the agent will serve.
//!
//! Gating is active only when a password is configured: without one,
//! every chat is approved and the list is inert. With one, an unknown
//! chat is parked as pending until someone in it supplies the password,
//! at which point the chat id joins the persisted approved list.
//!
//! Approved ids are stored as a JSON document and rewritten on every
//! mutation. Pending registrations are in-memory only and do not
//! survive a restart.

use recall_core::error::RecordError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Result of an approval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The password matched; the chat is now approved and persisted.
    Approved,
    /// The chat was already on the approved list.
    AlreadyApproved,
    /// The password did not match; nothing changed.
    WrongPassword,
    /// No password is configured, so gating is inactive.
    Disabled,
}

/// On-disk shape of the approval file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ApprovalFile {
    approved: Vec<String>,
}

#[derive(Debug, Default)]
struct ApprovalState {
    approved: HashSet<String>,
    pending: HashSet<String>,
}

/// The persisted set of approved chats plus in-memory pending ones.
pub struct ApprovalList {
    path: Option<PathBuf>,
    password: Option<String>,
    state: RwLock<ApprovalState>,
}

impl ApprovalList {
    /// Create a file-backed approval list. Existing approvals are loaded;
    /// a missing or unreadable file starts the list empty.
    pub fn new(path: PathBuf, password: Option<String>) -> Self {
        let approved = Self::load_from_disk(&path);
        Self {
            path: Some(path),
            password,
            state: RwLock::new(ApprovalState {
                approved,
                pending: HashSet::new(),
            }),
        }
    }

    /// Create an approval list with no backing file (tests, throwaway runs).
    pub fn ephemeral(password: Option<String>) -> Self {
        Self {
            path: None,
            password,
            state: RwLock::new(ApprovalState::default()),
        }
    }

    fn load_from_disk(path: &PathBuf) -> HashSet<String> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return HashSet::new(),
        };

        match serde_json::from_str::<ApprovalFile>(&content) {
            Ok(file) => file.approved.into_iter().collect(),
            Err(e) => {
                warn!(error = %e, "Approval file unreadable, starting empty");
                HashSet::new()
            }
        }
    }

    async fn flush(&self) -> Result<(), RecordError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let state = self.state.read().await;
        let mut approved: Vec<String> = state.approved.iter().cloned().collect();
        approved.sort();
        let file = ApprovalFile { approved };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RecordError::Storage(format!("Failed to create approval directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| RecordError::Storage(format!("Failed to serialize approvals: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| RecordError::Storage(format!("Failed to write approval file: {e}")))?;

        Ok(())
    }

    /// Whether gating is active at all.
    pub fn is_gated(&self) -> bool {
        self.password.is_some()
    }

    /// Whether a chat may be served. Always true when gating is inactive.
    pub async fn is_approved(&self, chat_id: &str) -> bool {
        if self.password.is_none() {
            return true;
        }
        self.state.read().await.approved.contains(chat_id)
    }

    /// Park an unapproved chat as pending. Returns true the first time a
    /// chat is parked, false if it was already pending or approved.
    pub async fn register_pending(&self, chat_id: &str) -> bool {
        let mut state = self.state.write().await;
        if state.approved.contains(chat_id) {
            return false;
        }
        let newly_pending = state.pending.insert(chat_id.to_string());
        if newly_pending {
            info!(chat_id, "Chat parked pending approval");
        }
        newly_pending
    }

    /// Attempt to approve a chat with the supplied password.
    ///
    /// On success the chat leaves pending, joins the approved set, and
    /// the list is flushed.
    pub async fn approve(
        &self,
        chat_id: &str,
        supplied_password: &str,
    ) -> Result<ApprovalOutcome, RecordError> {
        let Some(password) = &self.password else {
            return Ok(ApprovalOutcome::Disabled);
        };

        if supplied_password != password {
            warn!(chat_id, "Approval attempt with wrong password");
            return Ok(ApprovalOutcome::WrongPassword);
        }

        {
            let mut state = self.state.write().await;
            if state.approved.contains(chat_id) {
                return Ok(ApprovalOutcome::AlreadyApproved);
            }
            state.pending.remove(chat_id);
            state.approved.insert(chat_id.to_string());
        }

        self.flush().await?;
        info!(chat_id, "Chat approved");
        Ok(ApprovalOutcome::Approved)
    }

    /// Remove a chat from the approved list and flush.
    pub async fn revoke(&self, chat_id: &str) -> Result<bool, RecordError> {
        let removed = self.state.write().await.approved.remove(chat_id);
        if removed {
            self.flush().await?;
            info!(chat_id, "Chat approval revoked");
        }
        Ok(removed)
    }

    /// Approved chat ids, sorted for stable output.
    pub async fn approved_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.read().await.approved.iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for ApprovalList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalList")
            .field("path", &self.path)
            .field(
                "password",
                &self.password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn no_password_means_everything_approved() {
        let list = ApprovalList::ephemeral(None);
        assert!(!list.is_gated());
        assert!(list.is_approved("anyone").await);
        assert_eq!(
            list.approve("anyone", "whatever").await.unwrap(),
            ApprovalOutcome::Disabled
        );
    }

    #[tokio::test]
    async fn gated_chat_starts_unapproved() {
        let list = ApprovalList::ephemeral(Some("hunter2".into()));
        assert!(list.is_gated());
        assert!(!list.is_approved("chat1").await);
    }

    #[tokio::test]
    async fn correct_password_approves() {
        let list = ApprovalList::ephemeral(Some("hunter2".into()));
        list.register_pending("chat1").await;

        let outcome = list.approve("chat1", "hunter2").await.unwrap();
        assert_eq!(outcome, ApprovalOutcome::Approved);
        assert!(list.is_approved("chat1").await);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let list = ApprovalList::ephemeral(Some("hunter2".into()));
        let outcome = list.approve("chat1", "guess").await.unwrap();
        assert_eq!(outcome, ApprovalOutcome::WrongPassword);
        assert!(!list.is_approved("chat1").await);
    }

    #[tokio::test]
    async fn double_approval_reports_already_approved() {
        let list = ApprovalList::ephemeral(Some("hunter2".into()));
        list.approve("chat1", "hunter2").await.unwrap();
        assert_eq!(
            list.approve("chat1", "hunter2").await.unwrap(),
            ApprovalOutcome::AlreadyApproved
        );
    }

    #[tokio::test]
    async fn register_pending_is_idempotent() {
        let list = ApprovalList::ephemeral(Some("hunter2".into()));
        assert!(list.register_pending("chat1").await);
        assert!(!list.register_pending("chat1").await);

        list.approve("chat1", "hunter2").await.unwrap();
        assert!(!list.register_pending("chat1").await);
    }

    #[tokio::test]
    async fn approvals_survive_reload() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);

        let list = ApprovalList::new(path.clone(), Some("hunter2".into()));
        list.approve("chat1", "hunter2").await.unwrap();

        let reloaded = ApprovalList::new(path, Some("hunter2".into()));
        assert!(reloaded.is_approved("chat1").await);
        assert_eq!(reloaded.approved_ids().await, vec!["chat1".to_string()]);
    }

    #[tokio::test]
    async fn pending_does_not_survive_reload() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);

        let list = ApprovalList::new(path.clone(), Some("hunter2".into()));
        list.register_pending("chat1").await;
        // A pending-only chat was never flushed
        let reloaded = ApprovalList::new(path, Some("hunter2".into()));
        assert!(!reloaded.is_approved("chat1").await);
        assert!(reloaded.register_pending("chat1").await);
    }

    #[tokio::test]
    async fn revoke_removes_and_persists() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);

        let list = ApprovalList::new(path.clone(), Some("hunter2".into()));
        list.approve("chat1", "hunter2").await.unwrap();
        assert!(list.revoke("chat1").await.unwrap());
        assert!(!list.revoke("chat1").await.unwrap());

        let reloaded = ApprovalList::new(path, Some("hunter2".into()));
        assert!(!reloaded.is_approved("chat1").await);
    }

    #[tokio::test]
    async fn corrupted_approval_file_starts_empty() {
        let tmp = NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "not json at all").unwrap();

        let list = ApprovalList::new(tmp.path().to_path_buf(), Some("hunter2".into()));
        assert!(list.approved_ids().await.is_empty());
    }

    #[test]
    fn debug_redacts_password() {
        let list = ApprovalList::ephemeral(Some("hunter2".into()));
        let debug = format!("{list:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
