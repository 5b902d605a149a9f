//! Token-weighted combination of embedding vectors.

use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

/// An embedding vector paired with the number of tokens consumed to produce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEmbedding {
    pub embedding: Vec<f32>,
    pub weight: u64,
}

impl WeightedEmbedding {
    pub fn new(embedding: Vec<f32>, weight: u64) -> Self {
        Self { embedding, weight }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

/// Combines weighted embeddings into their per-dimension weighted mean.
///
/// The result's weight is the sum of the input weights. Products are accumulated in
/// `f64` in input order and narrowed to `f32` after the division, so the result is
/// deterministic for a given input order.
///
/// # Errors
///
/// Returns [`EmbeddingError::Validation`] if `items` is empty, if any vector's length
/// differs from the first one, or if the weights sum to zero.
pub fn combine(items: &[WeightedEmbedding]) -> Result<WeightedEmbedding> {
    let first = items.first().ok_or_else(|| {
        EmbeddingError::Validation("Embeddings must not be an empty collection.".to_string())
    })?;

    let dimension = first.dimension();
    if let Some((position, item)) = items
        .iter()
        .enumerate()
        .find(|(_, item)| item.dimension() != dimension)
    {
        return Err(EmbeddingError::Validation(format!(
            "All embeddings must have the same length: embedding {} has {} dimensions, expected {}.",
            position,
            item.dimension(),
            dimension
        )));
    }

    let total_weight = items
        .iter()
        .try_fold(0u64, |acc, item| acc.checked_add(item.weight))
        .ok_or_else(|| {
            EmbeddingError::Validation("Total embedding weight overflows u64.".to_string())
        })?;
    if total_weight == 0 {
        return Err(EmbeddingError::Validation(
            "Total embedding weight must be greater than zero.".to_string(),
        ));
    }

    let mut sums = vec![0f64; dimension];
    for item in items {
        let weight = item.weight as f64;
        for (sum, value) in sums.iter_mut().zip(&item.embedding) {
            *sum += f64::from(*value) * weight;
        }
    }

    let total = total_weight as f64;
    Ok(WeightedEmbedding {
        embedding: sums.into_iter().map(|sum| (sum / total) as f32).collect(),
        weight: total_weight,
    })
}
