mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use pdfrender_browser::{ChromiumRenderer, RendererConfig};
use pdfrender_core::PdfRenderer;
use pdfrender_storage::{ArtifactStore, FsArtifactStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .init();

    let config = cli.renderer_config(RendererConfig::from_env());
    tracing::debug!(endpoint = ?config.endpoint, settle = ?config.settle, "renderer configuration");

    let renderer = ChromiumRenderer::with_config(config);
    let store = FsArtifactStore::new(&cli.output_dir)?;

    let output = renderer.render(&cli.render_request()).await?;
    let saved = store.save(&cli.name, &output).await?;

    println!("{}", saved.pdf.display());
    println!("{}", saved.summaries.display());
    Ok(())
}
