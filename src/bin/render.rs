//! Portfolio Render CLI
//!
//! Discovers the portfolio, renders its media and writes the result as JSON
//! for the site templates.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use portfolio_content::{discover_portfolio, ContentValidator, PortfolioConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portfolio-render")]
#[command(about = "Validate portfolio content and render its media")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Content directory, overrides content.root
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Media output directory, overrides content.media_dir
    #[arg(short, long)]
    media_dir: Option<PathBuf>,

    /// Regenerate media even when the output already exists
    #[arg(long)]
    force_rewrite: bool,

    /// Write the rendered portfolio here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = PortfolioConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if let Some(root) = cli.root {
        config.content.root = root;
    }
    if let Some(media_dir) = cli.media_dir {
        config.content.media_dir = media_dir;
    }
    config.images.force_rewrite |= cli.force_rewrite;

    let validator = ContentValidator::from_config(&config).context("building validator")?;
    let portfolio = discover_portfolio(&config.content.root, &config.content.media_dir, &config.images, &validator)
        .with_context(|| format!("discovering portfolio in {}", config.content.root.display()))?;

    let json = serde_json::to_string_pretty(&portfolio)?;
    match cli.output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(output = %path.display(), "Wrote portfolio");
        }
        None => println!("{}", json),
    }

    Ok(())
}
