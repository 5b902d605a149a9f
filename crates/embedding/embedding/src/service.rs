//! The remote embedding service interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::combine::WeightedEmbedding;
use crate::error::Result;

/// Token usage reported by the embedding endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, total_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            total_tokens,
        }
    }

    /// Adds another call's usage to this one.
    pub fn accumulate(&mut self, other: Usage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// Vectors returned by one embedding call, in response index order, with the call's usage.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingOutput {
    pub vectors: Vec<Vec<f32>>,
    pub usage: Usage,
}

impl EmbeddingOutput {
    /// Pairs every vector with the call's total token count.
    pub fn into_weighted(self) -> Vec<WeightedEmbedding> {
        let weight = self.usage.total_tokens;
        self.vectors
            .into_iter()
            .map(|vector| WeightedEmbedding::new(vector, weight))
            .collect()
    }
}

/// Service for generating text embeddings with a remote model.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generates the embedding for a single piece of text with one remote call.
    async fn embed(&self, text: &str) -> Result<EmbeddingOutput>;

    /// The model identifier sent with each call.
    fn model(&self) -> &str;
}
