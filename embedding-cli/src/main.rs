//! embed CLI: embeds text with an Azure AI Foundry model. Config from a settings file or env.

use anyhow::Result;
use clap::Parser;
use embedding_cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    embedding_cli::init_tracing()?;

    let cli = Cli::parse();
    embedding_cli::run(cli).await
}
