//! # Text Embeddings
//!
//! This crate defines the embedding service interface and the logic that turns a long text
//! into one embedding:
//!
//! - [`EmbeddingService`]: one remote embedding call per piece of text.
//! - [`combine`]: token-weighted average of several [`WeightedEmbedding`]s.
//! - [`EmbeddingGenerator`]: chunks text (see the `chunking` crate), embeds every chunk,
//!   and combines the results.
//! - [`ModelDeploymentConfig`]: deployment options from the environment or a JSON settings file.

mod combine;
mod config;
mod error;
mod generator;
mod service;

pub use combine::{combine, WeightedEmbedding};
pub use config::{CombineMode, EmbeddingConfig, ModelDeploymentConfig};
pub use error::{EmbeddingError, Result};
pub use generator::{Embedding, EmbeddingBuildResult, EmbeddingGenerator, GeneratedEmbeddings};
pub use service::{EmbeddingOutput, EmbeddingService, Usage};
