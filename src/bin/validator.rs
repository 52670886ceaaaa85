//! Portfolio Validator CLI
//!
//! Checks every descriptor and its media without rendering anything.

use std::path::PathBuf;

use clap::Parser;
use portfolio_content::{lint_portfolio, ContentValidator, PortfolioConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portfolio-validator")]
#[command(about = "Validate portfolio descriptors")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Content directory, overrides content.root
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Also print spelling advisories
    #[arg(short, long)]
    verbose: bool,

    /// Write the full report as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every descriptor passed
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = PortfolioConfig::load_from(cli.config.as_deref())?;
    let root = cli.root.unwrap_or(config.content.root.clone());
    let validator = ContentValidator::from_config(&config)?;

    let reports = lint_portfolio(&root, &validator)?;

    let mut failed = 0;
    let mut advisories = 0;
    for report in &reports {
        advisories += report.advisories.len();
        if report.is_clean() {
            println!("  ok   {}", report.path.display());
        } else {
            failed += 1;
            println!("  FAIL {} ({})", report.path.display(), report.kind);
            for error in &report.errors {
                println!("       {}", error);
            }
        }
        if cli.verbose {
            for advisory in &report.advisories {
                println!("       misspelling? [{}] in {}", advisory.word, advisory.field);
            }
        }
    }

    println!(
        "\n{} descriptors, {} failed, {} spelling advisories",
        reports.len(),
        failed,
        advisories
    );

    if let Some(path) = cli.output {
        std::fs::write(&path, serde_json::to_string_pretty(&reports)?)?;
        println!("Report written to {:?}", path);
    }

    Ok(failed == 0)
}
