//! Shared test helpers for orchestrator tests.

use async_trait::async_trait;
use recall_core::completion::{ChatMessage, CompletionGateway};
use recall_core::embedding::EmbeddingGateway;
use recall_core::error::{CompletionError, EmbeddingError};
use std::sync::Mutex;

/// A mock completion gateway that returns a sequence of scripted results
/// and records every request it receives.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedCompletion {
    script: Mutex<Vec<Result<String, CompletionError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A gateway that answers every request with the same text.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// A gateway that reports a rate limit on every call.
    pub fn always_rate_limited(retry_after_secs: Option<u64>) -> Self {
        Self::new(
            std::iter::repeat_with(|| Err(CompletionError::RateLimited { retry_after_secs }))
                .take(16)
                .collect(),
        )
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The message sequence of the most recent request.
    pub fn last_request(&self) -> Vec<ChatMessage> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("ScriptedCompletion: no requests recorded")
    }
}

#[async_trait]
impl CompletionGateway for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(messages.to_vec());

        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            panic!("ScriptedCompletion: no more scripted results");
        }
        script.remove(0)
    }
}

/// Deterministic embedding: folds bytes into a small fixed vector so
/// equal texts embed equally and tests need no network.
pub struct StubEmbedding;

#[async_trait]
impl EmbeddingGateway for StubEmbedding {
    fn name(&self) -> &str {
        "stub"
    }

    fn dimension(&self) -> usize {
        8
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut v = vec![0.0f32; 8];
        for (i, b) in text.bytes().enumerate() {
            v[i % 8] += b as f32;
        }
        Ok(v)
    }
}
