//! OpenAI-compatible gateway implementation.
//!
//! Works with OpenAI and any endpoint exposing the same surface
//! (`/chat/completions` and `/embeddings`). One client implements both
//! the completion and embedding gateways since most deployments point
//! them at the same service.
//!
//! A 429 status maps to the rate-limit error, carrying the
//! `retry-after` header when the server provides one — the request
//! pacer keys its backoff off that value.

use async_trait::async_trait;
use recall_core::completion::{ChatMessage, CompletionGateway};
use recall_core::embedding::EmbeddingGateway;
use recall_core::error::{CompletionError, EmbeddingError};
use serde::Deserialize;
use tracing::{debug, warn};

/// An OpenAI-compatible completion + embedding client.
pub struct OpenAiCompatClient {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    embedding_model: String,
    embedding_dimension: usize,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a new client.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        embedding_model: impl Into<String>,
        embedding_dimension: usize,
        request_timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            embedding_model: embedding_model.into(),
            embedding_dimension,
            client,
        }
    }

    fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
        response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
    }
}

#[async_trait]
impl CompletionGateway for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();

        let body = serde_json::json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": self.temperature,
            "stream": false,
        });

        debug!(gateway = %self.name, model = %self.model, messages = messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(e.to_string())
                } else {
                    CompletionError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = Self::retry_after_secs(&response);
            warn!(gateway = %self.name, ?retry_after_secs, "Completion service rate-limited us");
            return Err(CompletionError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(CompletionError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Completion service returned error");
            return Err(CompletionError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiChatResponse =
            response.json().await.map_err(|e| CompletionError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl EmbeddingGateway for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": [text],
            "dimensions": self.embedding_dimension,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiEmbeddingResponse =
            response.json().await.map_err(|e| EmbeddingError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let vector = api_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::ApiError {
                status_code: 200,
                message: "No embeddings in response".into(),
            })?;

        if vector.len() != self.embedding_dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.embedding_dimension,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiEmbeddingResponse {
    #[serde(default)]
    data: Vec<ApiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ApiEmbedding {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_response_parses() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
        }"#;
        let parsed: ApiChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Hello!"));
    }

    #[test]
    fn chat_response_tolerates_null_content() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let parsed: ApiChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn embedding_response_parses() {
        let raw = r#"{"data": [{"embedding": [0.1, 0.2, 0.3]}]}"#;
        let parsed: ApiEmbeddingResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data[0].embedding.len(), 3);
    }
}
