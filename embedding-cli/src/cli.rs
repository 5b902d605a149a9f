//! CLI parser, config loading, and input reading.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chunking::{ChunkingService, FixedWidthChunking, LineChunking, SentenceChunking, WordChunking};
use clap::{Parser, ValueEnum};
use embedding::{CombineMode, ModelDeploymentConfig};

#[derive(Parser, Debug)]
#[command(name = "embed")]
#[command(about = "Embed text with an Azure AI Foundry model, combining chunks by token weight", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON settings file with an `embedding.model` section (default: EMBEDDING_* env vars).
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Read the text to embed from this file.
    #[arg(short, long, conflicts_with = "texts")]
    pub input: Option<PathBuf>,

    /// How each text is split before embedding.
    #[arg(short, long, value_enum, default_value_t = ChunkingPolicy::Lines)]
    pub chunking: ChunkingPolicy,

    /// Override the maximum chunk length in characters.
    #[arg(long)]
    pub max_chunk_length: Option<usize>,

    /// Unit width in characters for `--chunking fixed` (default: the max chunk length).
    #[arg(long)]
    pub width: Option<usize>,

    /// Override the requested embedding dimensions.
    #[arg(long)]
    pub dimensions: Option<u32>,

    /// Output one embedding per input text instead of one for the whole batch.
    #[arg(long)]
    pub per_input: bool,

    /// Whole-request timeout for each embedding call, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Texts to embed; stdin is read when neither texts nor --input are given.
    pub texts: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingPolicy {
    Lines,
    Sentences,
    Words,
    /// Fixed-width slices; no chunk exceeds the limit when the width fits it.
    Fixed,
    /// Send every text whole.
    None,
}

impl ChunkingPolicy {
    pub fn service(self, max_chunk_length: usize, width: usize) -> Option<Arc<dyn ChunkingService>> {
        let service: Arc<dyn ChunkingService> = match self {
            Self::Lines => Arc::new(LineChunking::new(max_chunk_length)),
            Self::Sentences => Arc::new(SentenceChunking::new(max_chunk_length)),
            Self::Words => Arc::new(WordChunking::new(max_chunk_length)),
            Self::Fixed => Arc::new(FixedWidthChunking::new(max_chunk_length, width)),
            Self::None => return None,
        };
        Some(service)
    }
}

impl Cli {
    /// The chunking service for `--chunking`, with `--width` defaulting to the max chunk length.
    pub fn chunking_service(&self, max_chunk_length: usize) -> Result<Option<Arc<dyn ChunkingService>>> {
        let width = self.width.unwrap_or(max_chunk_length);
        if width == 0 {
            anyhow::bail!("--width must be greater than zero");
        }
        Ok(self.chunking.service(max_chunk_length, width))
    }
}

/// Loads the deployment config from the settings file or the environment, applies CLI
/// overrides, and validates it.
pub fn load_config(cli: &Cli) -> Result<ModelDeploymentConfig> {
    let mut config = match &cli.settings {
        Some(path) => ModelDeploymentConfig::from_settings_file(path)?,
        None => ModelDeploymentConfig::from_env()?,
    };

    if let Some(max_chunk_length) = cli.max_chunk_length {
        config.max_chunk_length = max_chunk_length;
    }
    if cli.dimensions.is_some() {
        config.dimensions = cli.dimensions;
    }
    if cli.per_input {
        config.combine_mode = CombineMode::PerInput;
    }

    config.validate()?;
    Ok(config)
}

/// Collects the input texts: the `--input` file, else positional texts, else all of `stdin`.
pub fn read_inputs(cli: &Cli, mut stdin: impl Read) -> Result<Vec<String>> {
    let texts = if let Some(path) = &cli.input {
        vec![fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()))?]
    } else if !cli.texts.is_empty() {
        cli.texts.clone()
    } else {
        let mut text = String::new();
        stdin
            .read_to_string(&mut text)
            .context("Failed to read text from stdin")?;
        vec![text]
    };

    if texts.iter().all(|t| t.trim().is_empty()) {
        anyhow::bail!("Nothing to embed: input text is empty");
    }
    Ok(texts)
}
