//! # Azure AI Foundry Embedding Service
//!
//! This crate provides an implementation of the `EmbeddingService` trait for embedding models
//! deployed in Azure AI Foundry.
//!
//! ## FoundryEmbedding
//!
//! Sends one `POST {scheme}://{host}/models/embeddings` request per text with the body
//! `{"model": …, "input": [text], "dimensions": …}` and the `api-key` header when a key is
//! configured. The response's `data[].embedding` vectors and `usage.total_tokens` are
//! returned as an [`EmbeddingOutput`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use embedding::{EmbeddingGenerator, ModelDeploymentConfig};
//! use foundry_embedding::FoundryEmbedding;
//!
//! async fn example() -> Result<(), embedding::EmbeddingError> {
//!     let config = ModelDeploymentConfig::from_env()?;
//!     config.validate()?;
//!
//!     let service = Arc::new(FoundryEmbedding::from_config(&config)?);
//!     let generator = EmbeddingGenerator::from_config(service, &config);
//!
//!     let result = generator.generate(&["Hello, world!"]).await?;
//!     println!("Embedding dimension: {}", result.embeddings[0].vector.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! - 4xx responses map to `EmbeddingError::ClientRequest`, carrying the request URL and body.
//! - Other non-success responses map to `EmbeddingError::Service`.
//! - Undeserializable payloads map to `EmbeddingError::Resource`.
//! - Connection failures and timeouts map to `EmbeddingError::Transport`.
//!
//! Retries are left to the caller.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use embedding::{EmbeddingConfig, EmbeddingError, EmbeddingOutput, EmbeddingService, Result, Usage};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Path of the embeddings operation, appended to the endpoint host.
pub const EMBEDDINGS_PATH: &str = "/models/embeddings";

const LOG_PREVIEW_LEN: usize = 200;

/// Token count assumed for a response that reports no usage, so its vector still counts
/// once in a weighted average.
pub const MISSING_USAGE_TOKENS: u64 = 1;

/// Derives the embeddings URL from a deployment endpoint: keeps scheme, host and an
/// explicit port, and replaces any path with [`EMBEDDINGS_PATH`].
///
/// Real deployments are https. Plain http is accepted for local test servers only;
/// [`FoundryEmbedding::new`] logs a warning for it because the `api-key` header would travel
/// in cleartext.
///
/// `https://res.services.ai.azure.com/api/projects/p` becomes
/// `https://res.services.ai.azure.com/models/embeddings`.
pub fn embeddings_url(endpoint: &str) -> Result<String> {
    let parsed = Url::parse(endpoint.trim()).map_err(|e| {
        EmbeddingError::Configuration(format!("invalid endpoint {:?}: {}", endpoint, e))
    })?;
    let host = parsed.host_str().ok_or_else(|| {
        EmbeddingError::Configuration(format!("endpoint {:?} has no host", endpoint))
    })?;

    let mut url = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        url.push_str(&format!(":{}", port));
    }
    url.push_str(EMBEDDINGS_PATH);
    Ok(url)
}

/// Masks an API key for safe logging: first 4 chars + "***" + last 4 chars.
/// Keys of 12 characters or fewer are fully masked.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Azure AI Foundry embedding service implementation.
#[derive(Clone)]
pub struct FoundryEmbedding {
    client: Client,
    url: String,
    api_key: Option<String>,
    model: String,
    dimensions: Option<u32>,
}

impl fmt::Debug for FoundryEmbedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoundryEmbedding")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_deref().map(mask_key))
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl FoundryEmbedding {
    /// Creates a new Foundry embedding service.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Deployment endpoint, e.g. `https://{resource}.services.ai.azure.com/`.
    /// * `api_key` - API key; an empty key sends no `api-key` header.
    /// * `model` - Deployed model name.
    ///
    /// # Errors
    ///
    /// `EmbeddingError::Configuration` if the endpoint is not a URL with a host or the model
    /// name is empty.
    pub fn new(endpoint: &str, api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(EmbeddingError::Configuration(
                "embedding model name must not be empty".to_string(),
            ));
        }
        let api_key = Some(api_key.into()).filter(|k| !k.is_empty());

        let service = Self {
            client: Client::new(),
            url: embeddings_url(endpoint)?,
            api_key,
            model,
            dimensions: None,
        };
        if !service.is_secure() {
            warn!(
                url = %service.url,
                sends_key = service.api_key.is_some(),
                "Foundry endpoint is not https; use plain http only against a local test server"
            );
        }
        Ok(service)
    }

    /// Creates a service from deployment options (endpoint, key, name, dimensions).
    pub fn from_config(config: &dyn EmbeddingConfig) -> Result<Self> {
        Ok(Self::new(
            config.endpoint(),
            config.api_key().unwrap_or_default(),
            config.model_name(),
        )?
        .with_dimensions(config.dimensions()))
    }

    /// Requests embeddings with the given number of dimensions. Not every model supports it.
    pub fn with_dimensions(mut self, dimensions: Option<u32>) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Applies a whole-request timeout on a fresh HTTP client.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Configuration(format!("cannot build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Uses a caller-provided HTTP client (proxies, retries middleware, custom TLS).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// The URL every request is posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn dimensions(&self) -> Option<u32> {
        self.dimensions
    }

    /// Whether requests (and the `api-key` header) go over TLS.
    pub fn is_secure(&self) -> bool {
        self.url.starts_with("https://")
    }
}

#[async_trait]
impl EmbeddingService for FoundryEmbedding {
    /// Generates the embedding of `text` with one request to the deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request cannot be sent or times out (`Transport`)
    /// - The endpoint answers 4xx (`ClientRequest`, with the response body)
    /// - The endpoint answers any other non-success status (`Service`)
    /// - The payload is malformed or contains no embedding (`Resource`)
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<EmbeddingOutput> {
        info!(
            model = %self.model,
            text_preview = %preview(text),
            text_len = text.len(),
            "step: embedding Foundry embed request"
        );

        let request = EmbeddingRequest {
            model: &self.model,
            input: [text],
            dimensions: self.dimensions,
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, url = %self.url, "Foundry embed request failed");
            EmbeddingError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), url = %self.url, body = %preview(&body), "Foundry embed request rejected");
            return Err(if status.is_client_error() {
                EmbeddingError::ClientRequest {
                    endpoint: self.url.clone(),
                    status: status.as_u16(),
                    body,
                }
            } else {
                EmbeddingError::Service {
                    endpoint: self.url.clone(),
                    status: status.as_u16(),
                }
            });
        }

        let payload = response
            .text()
            .await
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;
        debug!(payload_len = payload.len(), "Foundry embed response received");

        let parsed: EmbeddingResponse = serde_json::from_str(&payload).map_err(|e| {
            warn!(error = %e, "Foundry embed response is malformed");
            EmbeddingError::Resource(format!("cannot deserialize embedding response: {}", e))
        })?;

        // Sort by index to ensure order matches input
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        if data.is_empty() {
            warn!("Foundry embed response has no embedding data");
            return Err(EmbeddingError::Resource("No embedding in response".to_string()));
        }

        let usage = parsed.usage.unwrap_or_else(|| {
            warn!(
                tokens = MISSING_USAGE_TOKENS,
                "Foundry embed response has no usage, assuming minimal token count"
            );
            Usage::new(0, MISSING_USAGE_TOKENS)
        });

        let vectors: Vec<Vec<f32>> = data.into_iter().map(|item| item.embedding).collect();
        info!(
            dimension = vectors[0].len(),
            total_tokens = usage.total_tokens,
            "step: embedding Foundry embed done"
        );
        Ok(EmbeddingOutput { vectors, usage })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
