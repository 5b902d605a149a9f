//! Model deployment configuration: trait, env-based loading, and JSON settings files.

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chunking::DEFAULT_MAX_CHUNK_LENGTH;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EmbeddingError, Result};

/// How the orchestrator combines vectors when several input texts are embedded at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombineMode {
    /// All chunks of all texts are combined into a single vector.
    #[default]
    Batch,
    /// Each input text gets its own combined vector.
    PerInput,
}

impl FromStr for CombineMode {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "batch" => Ok(Self::Batch),
            "per-input" | "perinput" => Ok(Self::PerInput),
            other => Err(EmbeddingError::Configuration(format!(
                "unknown combine mode {:?}, expected \"batch\" or \"per-input\"",
                other
            ))),
        }
    }
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch => f.write_str("batch"),
            Self::PerInput => f.write_str("per-input"),
        }
    }
}

/// Embedding model deployment configuration interface.
pub trait EmbeddingConfig: Send + Sync {
    /// Base URL of the model deployment, e.g. `https://{resource}.services.ai.azure.com/`.
    fn endpoint(&self) -> &str;
    /// API key sent as the `api-key` header. `None` when no key is configured.
    fn api_key(&self) -> Option<&str>;
    /// Deployed model identifier.
    fn model_name(&self) -> &str;
    /// Requested embedding dimensionality; not every model supports it.
    fn dimensions(&self) -> Option<u32>;
    fn max_chunk_length(&self) -> usize;
}

fn default_max_chunk_length() -> usize {
    DEFAULT_MAX_CHUNK_LENGTH
}

/// Options for an embedding model deployment in Azure AI Foundry.
///
/// Field names follow the settings-file convention (`Endpoint`, `Key`, `Name`,
/// `Dimensions`, `MaxChunkLength`); camelCase names are accepted as well.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelDeploymentConfig {
    #[serde(default, alias = "endpoint")]
    pub endpoint: String,
    #[serde(default, alias = "key")]
    pub key: String,
    #[serde(default, alias = "name")]
    pub name: String,
    #[serde(default, alias = "dimensions")]
    pub dimensions: Option<u32>,
    #[serde(default = "default_max_chunk_length", alias = "maxChunkLength")]
    pub max_chunk_length: usize,
    #[serde(default, alias = "combineMode")]
    pub combine_mode: CombineMode,
}

impl fmt::Debug for ModelDeploymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDeploymentConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &if self.key.is_empty() { "" } else { "***" })
            .field("name", &self.name)
            .field("dimensions", &self.dimensions)
            .field("max_chunk_length", &self.max_chunk_length)
            .field("combine_mode", &self.combine_mode)
            .finish()
    }
}

impl Default for ModelDeploymentConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            key: String::new(),
            name: String::new(),
            dimensions: None,
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            combine_mode: CombineMode::default(),
        }
    }
}

impl EmbeddingConfig for ModelDeploymentConfig {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }
    fn api_key(&self) -> Option<&str> {
        Some(self.key.as_str()).filter(|k| !k.is_empty())
    }
    fn model_name(&self) -> &str {
        &self.name
    }
    fn dimensions(&self) -> Option<u32> {
        self.dimensions
    }
    fn max_chunk_length(&self) -> usize {
        self.max_chunk_length
    }
}

impl ModelDeploymentConfig {
    pub fn new(endpoint: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Load from environment variables:
    /// `EMBEDDING_ENDPOINT`, `EMBEDDING_KEY`, `EMBEDDING_MODEL`, `EMBEDDING_DIMENSIONS`,
    /// `EMBEDDING_MAX_CHUNK_LENGTH`, `EMBEDDING_COMBINE_MODE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from any variable lookup; `from_env` uses the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let text = |name: &str| lookup(name).map(|v| v.trim().to_string()).unwrap_or_default();

        Ok(Self {
            endpoint: text("EMBEDDING_ENDPOINT"),
            key: text("EMBEDDING_KEY"),
            name: text("EMBEDDING_MODEL"),
            dimensions: parse_var(&lookup, "EMBEDDING_DIMENSIONS")?,
            max_chunk_length: parse_var(&lookup, "EMBEDDING_MAX_CHUNK_LENGTH")?
                .unwrap_or(DEFAULT_MAX_CHUNK_LENGTH),
            combine_mode: match lookup("EMBEDDING_COMBINE_MODE") {
                Some(v) if !v.trim().is_empty() => v.parse()?,
                _ => CombineMode::default(),
            },
        })
    }

    /// Load the `embedding.model` section of a JSON settings file, e.g.
    ///
    /// ```json
    /// { "embedding": { "model": { "Endpoint": "https://…", "Key": "…", "Name": "…" } } }
    /// ```
    pub fn from_settings_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EmbeddingError::Configuration(format!(
                "cannot read settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_settings_str(&content)
    }

    pub fn from_settings_str(content: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(content).map_err(|e| {
            EmbeddingError::Configuration(format!("settings are not valid JSON: {}", e))
        })?;
        let section = root
            .get("embedding")
            .and_then(|embedding| embedding.get("model"))
            .cloned()
            .ok_or_else(|| {
                EmbeddingError::Configuration(
                    "settings have no \"embedding.model\" section".to_string(),
                )
            })?;
        serde_json::from_value(section).map_err(|e| {
            EmbeddingError::Configuration(format!("invalid \"embedding.model\" section: {}", e))
        })
    }

    /// Validate config: endpoint and model name are required, the chunk cap must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(EmbeddingError::Configuration(
                "embedding endpoint is required (EMBEDDING_ENDPOINT or Endpoint)".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(EmbeddingError::Configuration(
                "embedding model name is required (EMBEDDING_MODEL or Name)".to_string(),
            ));
        }
        if self.max_chunk_length == 0 {
            return Err(EmbeddingError::Configuration(
                "max chunk length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(|e| {
            EmbeddingError::Configuration(format!("{}={:?} is invalid: {}", name, raw, e))
        }),
        _ => Ok(None),
    }
}
