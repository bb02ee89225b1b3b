//! Authoritative context record — persistent JSONL storage.
//!
//! The external index stores vectors plus searchable attributes and is
//! not guaranteed to retain full payloads; this record is the source of
//! truth for them. Each line is a JSON-encoded `Context`.
//!
//! Entries are loaded into memory on creation and flushed to disk on
//! every mutation. Small-scale and non-transactional on purpose.

use recall_core::context::{Context, ContextId};
use recall_core::error::RecordError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// The authoritative record of full context payloads, keyed by id.
pub struct ContextRecord {
    path: Option<PathBuf>,
    contexts: Arc<RwLock<Vec<Context>>>,
}

impl ContextRecord {
    /// Create a file-backed record at the given path.
    ///
    /// If the file exists, contexts are loaded from it.
    /// If the file does not exist, starts empty (created on first write).
    pub fn new(path: PathBuf) -> Self {
        let contexts = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = contexts.len(), "Context record loaded");
        Self {
            path: Some(path),
            contexts: Arc::new(RwLock::new(contexts)),
        }
    }

    /// Create a record with no backing file (tests, throwaway runs).
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            contexts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Load contexts from a JSONL file, skipping corrupted lines.
    fn load_from_disk(path: &PathBuf) -> Vec<Context> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(), // File doesn't exist yet — start empty
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Context>(line) {
                Ok(ctx) => Some(ctx),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted context record line");
                    None
                }
            })
            .collect()
    }

    /// Flush all contexts to disk as JSONL. No-op for ephemeral records.
    async fn flush(&self) -> Result<(), RecordError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let contexts = self.contexts.read().await;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RecordError::Storage(format!("Failed to create record directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for ctx in contexts.iter() {
            let line = serde_json::to_string(ctx)
                .map_err(|e| RecordError::Storage(format!("Failed to serialize context: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(path, &content)
            .map_err(|e| RecordError::Storage(format!("Failed to write record file: {e}")))?;

        Ok(())
    }

    /// Insert a context and flush.
    pub async fn insert(&self, context: Context) -> Result<(), RecordError> {
        self.contexts.write().await.push(context);
        self.flush().await
    }

    /// Remove a context by id and flush. Returns whether it existed.
    pub async fn remove(&self, id: &ContextId) -> Result<bool, RecordError> {
        let mut contexts = self.contexts.write().await;
        let len_before = contexts.len();
        contexts.retain(|c| c.id != *id);
        let removed = contexts.len() < len_before;
        drop(contexts);
        if removed {
            self.flush().await?;
        }
        Ok(removed)
    }

    /// Look up a context by id.
    pub async fn get(&self, id: &str) -> Option<Context> {
        let contexts = self.contexts.read().await;
        contexts.iter().find(|c| c.id.as_str() == id).cloned()
    }

    /// All tracked ids, in insertion order.
    pub async fn ids(&self) -> Vec<ContextId> {
        self.contexts.read().await.iter().map(|c| c.id.clone()).collect()
    }

    /// Number of tracked contexts.
    pub async fn count(&self) -> usize {
        self.contexts.read().await.len()
    }

    /// Timestamp of the most recently created context, if any.
    pub async fn latest_timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.contexts
            .read()
            .await
            .iter()
            .map(|c| c.attributes.timestamp)
            .max()
    }

    /// Remove every context and flush.
    pub async fn clear(&self) -> Result<(), RecordError> {
        self.contexts.write().await.clear();
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn test_context(owner: &str, text: &str) -> Context {
        Context::new(owner, text, "general", serde_json::Map::new())
    }

    #[tokio::test]
    async fn insert_and_reload_persists() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);

        let record = ContextRecord::new(path.clone());
        let ctx = test_context("alice", "Rust is great");
        let id = ctx.id.clone();
        record.insert(ctx).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Rust is great"));

        let record2 = ContextRecord::new(path);
        let loaded = record2.get(id.as_str()).await;
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().attributes.text, "Rust is great");
    }

    #[tokio::test]
    async fn remove_persists() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);

        let record = ContextRecord::new(path.clone());
        let ctx = test_context("alice", "to be removed");
        let id = ctx.id.clone();
        record.insert(ctx).await.unwrap();
        assert!(record.remove(&id).await.unwrap());

        let record2 = ContextRecord::new(path);
        assert!(record2.get(id.as_str()).await.is_none());
        assert_eq!(record2.count().await, 0);
    }

    #[tokio::test]
    async fn remove_unknown_id_is_false_not_error() {
        let record = ContextRecord::ephemeral();
        let removed = record
            .remove(&ContextId::from("nobody_nothing"))
            .await
            .unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn latest_timestamp_tracks_newest() {
        let record = ContextRecord::ephemeral();
        assert!(record.latest_timestamp().await.is_none());

        record.insert(test_context("alice", "first")).await.unwrap();
        let after_first = record.latest_timestamp().await.unwrap();

        record.insert(test_context("alice", "second")).await.unwrap();
        let after_second = record.latest_timestamp().await.unwrap();
        assert!(after_second >= after_first);
    }

    #[tokio::test]
    async fn handles_corrupted_lines() {
        let mut tmp = NamedTempFile::new().unwrap();
        let valid = test_context("alice", "valid");
        writeln!(tmp, "{}", serde_json::to_string(&valid).unwrap()).unwrap();
        writeln!(tmp, "this is not json").unwrap();
        let path = tmp.path().to_path_buf();

        let record = ContextRecord::new(path);
        assert_eq!(record.count().await, 1);
    }

    #[tokio::test]
    async fn handles_missing_file_gracefully() {
        let path = PathBuf::from("/tmp/recall_test_nonexistent_contexts.jsonl");
        let _ = std::fs::remove_file(&path);
        let record = ContextRecord::new(path);
        assert_eq!(record.count().await, 0);
    }
}
