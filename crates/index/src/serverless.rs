//! Serverless vector-index gateway — HTTP client for a Pinecone-style
//! REST API.
//!
//! Two planes:
//! - Control plane: index provisioning (`POST /indexes`). A conflict
//!   response (HTTP 409 / "ALREADY_EXISTS") means the index is already
//!   there and is treated as success.
//! - Data plane: `POST /vectors/upsert`, `POST /query`,
//!   `POST /vectors/delete`, all partitioned by a namespace string.

use async_trait::async_trait;
use recall_core::context::ContextAttributes;
use recall_core::error::IndexError;
use recall_core::index::{IndexGateway, IndexMatch, IndexRecord, IndexSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// An HTTP gateway to a serverless vector index.
pub struct ServerlessIndex {
    control_url: String,
    data_url: String,
    api_key: String,
    namespace: String,
    client: reqwest::Client,
}

impl ServerlessIndex {
    /// Create a new serverless index gateway.
    pub fn new(
        control_url: impl Into<String>,
        data_url: impl Into<String>,
        api_key: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| IndexError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            control_url: control_url.into().trim_end_matches('/').to_string(),
            data_url: data_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            namespace: namespace.into(),
            client,
        })
    }

    async fn post(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, IndexError> {
        self.client
            .post(url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| IndexError::Network(e.to_string()))
    }
}

#[async_trait]
impl IndexGateway for ServerlessIndex {
    fn name(&self) -> &str {
        "serverless"
    }

    async fn ensure_index(&self, spec: &IndexSpec) -> Result<(), IndexError> {
        let url = format!("{}/indexes", self.control_url);
        let body = serde_json::json!({
            "name": spec.name,
            "dimension": spec.dimension,
            "metric": spec.metric.as_str(),
            "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } },
        });

        let response = self.post(&url, &body).await.map_err(|e| {
            IndexError::ProvisioningFailed(format!("create request failed: {e}"))
        })?;

        let status = response.status().as_u16();

        if status == 409 {
            info!(index = %spec.name, "Index already exists, skipping creation");
            return Ok(());
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            // Some control planes report conflicts as a plain error body.
            if error_body.contains("ALREADY_EXISTS") {
                info!(index = %spec.name, "Index already exists, skipping creation");
                return Ok(());
            }
            return Err(IndexError::ProvisioningFailed(format!(
                "create returned status {status}: {error_body}"
            )));
        }

        info!(index = %spec.name, dimension = spec.dimension, "Index created");
        Ok(())
    }

    async fn upsert(&self, record: IndexRecord) -> Result<(), IndexError> {
        let url = format!("{}/vectors/upsert", self.data_url);
        let body = serde_json::json!({
            "vectors": [ApiVector::from(&record)],
            "namespace": self.namespace,
        });

        debug!(id = %record.id, namespace = %self.namespace, "Upserting vector");

        let response = self.post(&url, &body).await?;
        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            return Err(IndexError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>, IndexError> {
        let url = format!("{}/query", self.data_url);
        let body = serde_json::json!({
            "vector": vector,
            "topK": k,
            "namespace": self.namespace,
            "includeMetadata": true,
        });

        let response = self.post(&url, &body).await?;
        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            return Err(IndexError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiQueryResponse =
            response.json().await.map_err(|e| IndexError::ApiError {
                status_code: 200,
                message: format!("Failed to parse query response: {e}"),
            })?;

        let mut matches = Vec::with_capacity(api_response.matches.len());
        for m in api_response.matches {
            match m.metadata {
                Some(attributes) => matches.push(IndexMatch {
                    id: m.id,
                    score: m.score,
                    attributes,
                }),
                None => {
                    // A vector written outside this gateway; unusable for
                    // scoping, so it is skipped.
                    warn!(id = %m.id, "Query match without attributes, skipping");
                }
            }
        }

        Ok(matches)
    }

    async fn delete(&self, id: &str) -> Result<(), IndexError> {
        let url = format!("{}/vectors/delete", self.data_url);
        let body = serde_json::json!({
            "ids": [id],
            "namespace": self.namespace,
        });

        let response = self.post(&url, &body).await?;
        let status = response.status().as_u16();

        // Absence of the target is success
        if status == 404 {
            return Ok(());
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            return Err(IndexError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(())
    }

    async fn clear_namespace(&self) -> Result<(), IndexError> {
        let url = format!("{}/vectors/delete", self.data_url);
        let body = serde_json::json!({
            "deleteAll": true,
            "namespace": self.namespace,
        });

        let response = self.post(&url, &body).await?;
        let status = response.status().as_u16();

        // A namespace that never existed is already clear
        if status == 404 {
            return Ok(());
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            return Err(IndexError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(())
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct ApiVector {
    id: String,
    values: Vec<f32>,
    metadata: ContextAttributes,
}

impl From<&IndexRecord> for ApiVector {
    fn from(record: &IndexRecord) -> Self {
        Self {
            id: record.id.clone(),
            values: record.vector.clone(),
            metadata: record.attributes.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiQueryResponse {
    #[serde(default)]
    matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize)]
struct ApiMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<ContextAttributes>,
}
