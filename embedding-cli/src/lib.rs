//! # embedding-cli
//!
//! Console entry point: loads deployment settings, reads text, and prints the combined
//! embedding as JSON.

pub mod cli;
pub mod logger;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use embedding::{EmbeddingGenerator, ModelDeploymentConfig};
use foundry_embedding::FoundryEmbedding;
use tracing::info;

pub use cli::{load_config, read_inputs, ChunkingPolicy, Cli};
pub use logger::init_tracing;

/// Builds the generator described by `cli` and `config`.
pub fn build_generator(cli: &Cli, config: &ModelDeploymentConfig) -> Result<EmbeddingGenerator> {
    let mut service = FoundryEmbedding::from_config(config)?;
    if let Some(secs) = cli.timeout_secs {
        service = service.with_timeout(Duration::from_secs(secs))?;
    }
    info!(url = %service.url(), model = %config.name, "embedding service ready");

    let generator = EmbeddingGenerator::new(Arc::new(service)).with_combine_mode(config.combine_mode);
    Ok(match cli.chunking_service(config.max_chunk_length)? {
        Some(chunking) => generator.with_chunking(chunking),
        None => generator,
    })
}

/// Runs the CLI: embeds the inputs and writes the result as pretty JSON to stdout.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let texts = read_inputs(&cli, io::stdin().lock())?;
    let generator = build_generator(&cli, &config)?;

    let result = generator.generate(texts.as_slice()).await?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &result).context("Failed to write result")?;
    writeln!(stdout)?;
    Ok(())
}
