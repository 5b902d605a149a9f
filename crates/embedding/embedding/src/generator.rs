//! Chunked embedding generation.
//!
//! [`EmbeddingGenerator`] is the single orchestrator: it chunks input text with an optional
//! [`ChunkingService`], calls the [`EmbeddingService`] once per chunk, and reduces the
//! token-weighted vectors with [`combine`]. It serves two entry points:
//!
//! - [`EmbeddingGenerator::generate`] embeds a batch of independent texts and combines them
//!   according to the configured [`CombineMode`].
//! - The builder methods ([`EmbeddingGenerator::add_text_chunk`], [`EmbeddingGenerator::build`], …)
//!   accumulate chunks of one text and combine them into one [`EmbeddingBuildResult`].

use std::io::BufRead;
use std::sync::Arc;

use chunking::{ChunkingService, LineChunking};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::combine::{combine, WeightedEmbedding};
use crate::config::{CombineMode, EmbeddingConfig, ModelDeploymentConfig};
use crate::error::{EmbeddingError, Result};
use crate::service::{EmbeddingService, Usage};

/// One combined embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    /// Tokens consumed by the calls combined into this vector.
    pub tokens: u64,
    pub model_id: String,
}

/// Result of [`EmbeddingGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedEmbeddings {
    /// One embedding in [`CombineMode::Batch`], one per input text in [`CombineMode::PerInput`].
    pub embeddings: Vec<Embedding>,
    /// Usage summed over every remote call of the batch.
    pub usage: Usage,
    pub model: String,
}

/// Result of [`EmbeddingGenerator::build`].
///
/// The embedding is the average of the chunk embeddings, weighted by the tokens consumed
/// for each chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingBuildResult {
    /// The concatenated chunks the embedding was built from.
    pub text: String,
    pub embedding: Vec<f32>,
    pub tokens_consumed: u64,
    pub model: String,
}

/// Chunks text, embeds every chunk remotely, and combines the results.
///
/// The builder methods mutate the pending chunk list through `&mut self`; share one
/// generator between tasks only behind a lock, or use one generator per build.
pub struct EmbeddingGenerator {
    service: Arc<dyn EmbeddingService>,
    chunking: Option<Arc<dyn ChunkingService>>,
    combine_mode: CombineMode,
    chunks: Vec<String>,
}

impl EmbeddingGenerator {
    /// Creates a generator that embeds each text whole, in [`CombineMode::Batch`].
    pub fn new(service: Arc<dyn EmbeddingService>) -> Self {
        Self {
            service,
            chunking: None,
            combine_mode: CombineMode::default(),
            chunks: Vec::new(),
        }
    }

    /// Creates a generator with line chunking capped at the configured max chunk length
    /// and the configured combine mode.
    pub fn from_config(service: Arc<dyn EmbeddingService>, config: &ModelDeploymentConfig) -> Self {
        Self::new(service)
            .with_chunking(Arc::new(LineChunking::new(config.max_chunk_length())))
            .with_combine_mode(config.combine_mode)
    }

    pub fn with_chunking(mut self, chunking: Arc<dyn ChunkingService>) -> Self {
        self.chunking = Some(chunking);
        self
    }

    pub fn without_chunking(mut self) -> Self {
        self.chunking = None;
        self
    }

    pub fn with_combine_mode(mut self, combine_mode: CombineMode) -> Self {
        self.combine_mode = combine_mode;
        self
    }

    pub fn combine_mode(&self) -> CombineMode {
        self.combine_mode
    }

    pub fn model(&self) -> &str {
        self.service.model()
    }

    /// Embeds `texts` and combines the vectors according to the combine mode.
    ///
    /// With a chunking service each text is chunked and embedded chunk by chunk; otherwise
    /// each text is embedded whole. Calls are made sequentially, in input order. Any failed
    /// call fails the whole batch.
    ///
    /// # Errors
    ///
    /// - [`EmbeddingError::Validation`] if `texts` is empty or a group has nothing to combine
    ///   (an empty text under chunking produces no chunks).
    /// - Any error from the embedding service or from reading a chunk.
    #[instrument(skip(self, texts), fields(model = %self.service.model(), inputs = texts.len(), mode = %self.combine_mode))]
    pub async fn generate<S>(&self, texts: &[S]) -> Result<GeneratedEmbeddings>
    where
        S: AsRef<str> + Sync,
    {
        if texts.is_empty() {
            return Err(EmbeddingError::Validation(
                "At least one input text is required.".to_string(),
            ));
        }

        info!(inputs = texts.len(), "step: embedding generate start");

        let mut usage = Usage::default();
        let mut groups: Vec<Vec<WeightedEmbedding>> = Vec::with_capacity(texts.len());
        for text in texts {
            let text = text.as_ref();
            let mut weighted = Vec::new();
            match &self.chunking {
                Some(chunking) => {
                    for chunk in chunking.chunk_text(text) {
                        let chunk = chunk?;
                        weighted.extend(self.embed_weighted(&chunk, &mut usage).await?);
                    }
                }
                None => weighted.extend(self.embed_weighted(text, &mut usage).await?),
            }
            groups.push(weighted);
        }

        let model = self.service.model().to_string();
        let embeddings = match self.combine_mode {
            CombineMode::Batch => {
                let all: Vec<WeightedEmbedding> = groups.into_iter().flatten().collect();
                vec![self.to_embedding(combine(&all)?)]
            }
            CombineMode::PerInput => groups
                .iter()
                .map(|group| combine(group).map(|combined| self.to_embedding(combined)))
                .collect::<Result<Vec<_>>>()?,
        };

        info!(
            embeddings = embeddings.len(),
            total_tokens = usage.total_tokens,
            "step: embedding generate done"
        );
        Ok(GeneratedEmbeddings {
            embeddings,
            usage,
            model,
        })
    }

    /// Adds a text chunk to the pending list as-is.
    ///
    /// An embedding is generated for each chunk separately; [`EmbeddingGenerator::build`]
    /// then averages them weighted by tokens consumed, so a chunk that consumes more tokens
    /// has a greater impact on the final embedding.
    pub fn add_text_chunk(&mut self, text: impl Into<String>) -> &mut Self {
        self.chunks.push(text.into());
        self
    }

    /// Chunks `text` with the configured chunking service and adds the chunks.
    /// Without a chunking service the whole text is added as one chunk.
    pub fn add_text_chunks(&mut self, text: &str) -> Result<&mut Self> {
        match self.chunking.clone() {
            Some(chunking) => self.add_text_chunks_with(text, chunking.as_ref()),
            None => Ok(self.add_text_chunk(text)),
        }
    }

    /// Chunks `text` with `chunking` and adds the chunks.
    pub fn add_text_chunks_with(
        &mut self,
        text: &str,
        chunking: &dyn ChunkingService,
    ) -> Result<&mut Self> {
        self.add_text_chunks_from_reader(text.as_bytes(), chunking)
    }

    /// Reads `reader` to the end through `chunking` and adds the chunks. The reader is
    /// dropped before this returns. Nothing is added if reading fails.
    pub fn add_text_chunks_from_reader<R>(
        &mut self,
        reader: R,
        chunking: &dyn ChunkingService,
    ) -> Result<&mut Self>
    where
        R: BufRead + Send,
    {
        let chunks = chunking
            .chunks(Box::new(reader))
            .collect::<std::io::Result<Vec<_>>>()?;
        debug!(chunks = chunks.len(), "text chunks added");
        self.chunks.extend(chunks);
        Ok(self)
    }

    pub fn clear_chunks(&mut self) -> &mut Self {
        self.chunks.clear();
        self
    }

    pub fn pending_chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Embeds every pending chunk and combines them into one embedding.
    ///
    /// The pending list is taken when the build starts, so the generator is ready for an
    /// unrelated text afterwards whether the build succeeds or fails.
    ///
    /// # Errors
    ///
    /// [`EmbeddingError::Validation`] if no chunks were added, otherwise any error from the
    /// embedding service or from [`combine`].
    #[instrument(skip(self), fields(model = %self.service.model(), chunks = self.chunks.len()))]
    pub async fn build(&mut self) -> Result<EmbeddingBuildResult> {
        let chunks = std::mem::take(&mut self.chunks);
        if chunks.is_empty() {
            return Err(EmbeddingError::Validation(
                "No text chunks have been added.".to_string(),
            ));
        }

        let mut usage = Usage::default();
        let mut weighted = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            weighted.extend(self.embed_weighted(chunk, &mut usage).await?);
        }
        let combined = combine(&weighted)?;

        info!(
            chunks = chunks.len(),
            tokens_consumed = combined.weight,
            "step: embedding build done"
        );
        Ok(EmbeddingBuildResult {
            text: chunks.concat(),
            embedding: combined.embedding,
            tokens_consumed: combined.weight,
            model: self.service.model().to_string(),
        })
    }

    async fn embed_weighted(&self, text: &str, usage: &mut Usage) -> Result<Vec<WeightedEmbedding>> {
        let output = self.service.embed(text).await?;
        debug!(
            vectors = output.vectors.len(),
            total_tokens = output.usage.total_tokens,
            "chunk embedded"
        );
        usage.accumulate(output.usage);
        Ok(output.into_weighted())
    }

    fn to_embedding(&self, combined: WeightedEmbedding) -> Embedding {
        Embedding {
            vector: combined.embedding,
            tokens: combined.weight,
            model_id: self.service.model().to_string(),
        }
    }
}
