//! Configuration loading, validation, and management for Recall.
//!
//! Loads configuration from `~/.recall/config.toml` with environment
//! variable overrides. Validates all settings at startup. Missing
//! credentials are fatal only for the operations that need them, so
//! `require_*` checks happen at the call sites that wire up gateways.

use recall_core::index::DistanceMetric;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.recall/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion/embedding service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion service configuration.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Embedding configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector index configuration.
    #[serde(default)]
    pub index: IndexConfig,

    /// Request pacing configuration.
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Durable storage paths.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("completion", &self.completion)
            .field("embedding", &self.embedding)
            .field("index", &self.index)
            .field("pacing", &self.pacing)
            .field("storage", &self.storage)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL of the OpenAI-compatible completion endpoint.
    #[serde(default = "default_completion_url")]
    pub base_url: String,

    /// Model name sent with every request.
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_completion_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_completion_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout() -> u64 {
    120
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_url(),
            model: default_completion_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimensionality. Must match the index dimension.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_dimension() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_dimension(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index backend: "serverless" or "in_memory".
    #[serde(default = "default_index_backend")]
    pub backend: String,

    /// Index name.
    #[serde(default = "default_index_name")]
    pub name: String,

    /// Namespace partitioning this deployment's vectors.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Vector dimensionality. Must match the embedding dimension.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Distance metric, fixed at index creation.
    #[serde(default)]
    pub metric: DistanceMetric,

    /// Control-plane URL (index provisioning).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_url: Option<String>,

    /// Data-plane URL (upsert/query/delete).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,

    /// API key for the index service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_index_backend() -> String {
    "in_memory".into()
}
fn default_index_name() -> String {
    "recall-contexts".into()
}
fn default_namespace() -> String {
    "default".into()
}

impl std::fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexConfig")
            .field("backend", &self.backend)
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("dimension", &self.dimension)
            .field("metric", &self.metric)
            .field("control_url", &self.control_url)
            .field("data_url", &self.data_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: default_index_backend(),
            name: default_index_name(),
            namespace: default_namespace(),
            dimension: default_dimension(),
            metric: DistanceMetric::Cosine,
            control_url: None,
            data_url: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Minimum seconds between outbound completion dispatches.
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: f64,

    /// Total attempts before a rate-limit error propagates.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff used when the service gives no retry-after hint.
    #[serde(default = "default_retry_after")]
    pub default_retry_after_secs: u64,
}

fn default_min_interval() -> f64 {
    16.5
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_after() -> u64 {
    60
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval(),
            max_retries: default_max_retries(),
            default_retry_after_secs: default_retry_after(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Authoritative context record (JSONL), rewritten on every mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contexts_path: Option<PathBuf>,

    /// Approved-tenant list (JSON), rewritten on every mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approvals_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            contexts_path: None,
            approvals_path: None,
        }
    }
}

impl StorageConfig {
    /// Resolved context record path (default under the config dir).
    pub fn contexts_path(&self) -> PathBuf {
        self.contexts_path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("contexts.jsonl"))
    }

    /// Resolved approvals path (default under the config dir).
    pub fn approvals_path(&self) -> PathBuf {
        self.approvals_path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("approvals.json"))
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.recall/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `RECALL_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    /// - `RECALL_INDEX_API_KEY` / `PINECONE_API_KEY` for the index
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("RECALL_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if config.index.api_key.is_none() {
            config.index.api_key = std::env::var("RECALL_INDEX_API_KEY")
                .ok()
                .or_else(|| std::env::var("PINECONE_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("RECALL_MODEL") {
            config.completion.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".recall")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.completion.temperature < 0.0 || self.completion.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "completion.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be > 0".into(),
            ));
        }

        if self.embedding.dimension != self.index.dimension {
            return Err(ConfigError::ValidationError(format!(
                "embedding.dimension ({}) must match index.dimension ({})",
                self.embedding.dimension, self.index.dimension
            )));
        }

        if self.pacing.min_interval_secs < 0.0 {
            return Err(ConfigError::ValidationError(
                "pacing.min_interval_secs must be >= 0".into(),
            ));
        }

        if self.pacing.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "pacing.max_retries must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// The completion API key, or a fatal configuration error.
    ///
    /// Missing required credentials are fatal at startup, not per-request.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or_else(|| {
            ConfigError::MissingCredentials(
                "no completion API key: set RECALL_API_KEY or api_key in config.toml".into(),
            )
        })
    }

    /// The index API key, or a fatal configuration error.
    pub fn require_index_api_key(&self) -> Result<&str, ConfigError> {
        self.index.api_key.as_deref().ok_or_else(|| {
            ConfigError::MissingCredentials(
                "no index API key: set RECALL_INDEX_API_KEY or index.api_key in config.toml".into(),
            )
        })
    }

    /// Generate a default config TOML string (for `onboard`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            completion: CompletionConfig::default(),
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            pacing: PacingConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.index.namespace, "default");
        assert_eq!(config.embedding.dimension, 384);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.completion.model, config.completion.model);
        assert_eq!(parsed.index.name, config.index.name);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            completion: CompletionConfig {
                temperature: 5.0,
                ..CompletionConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let mut config = AppConfig::default();
        config.index.dimension = 768;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retries_rejected() {
        let mut config = AppConfig::default();
        config.pacing.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().index.name, "recall-contexts");
    }

    #[test]
    fn missing_api_key_is_a_credentials_error() {
        let config = AppConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingCredentials(_))
        ));
    }

    #[test]
    fn debug_redacts_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("recall-contexts"));
        assert!(toml_str.contains("16.5"));
    }

    #[test]
    fn pacing_config_parsing() {
        let toml_str = r#"
[pacing]
min_interval_secs = 5.0
max_retries = 2
default_retry_after_secs = 30
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pacing.min_interval_secs, 5.0);
        assert_eq!(config.pacing.max_retries, 2);
        assert_eq!(config.pacing.default_retry_after_secs, 30);
    }
}
