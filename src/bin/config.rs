//! Portfolio Config CLI
//!
//! View and manage pipeline configuration.

use clap::{Parser, Subcommand};
use portfolio_content::PortfolioConfig;

#[derive(Parser)]
#[command(name = "portfolio-config")]
#[command(about = "View and manage portfolio pipeline configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration to a file
    Init {
        /// Output path
        #[arg(short, long, default_value = "portfolio.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = PortfolioConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("Portfolio Configuration\n");
                println!("Content:");
                println!("  Root: {:?}", cfg.content.root);
                println!("  Media: {:?}", cfg.content.media_dir);

                let images = &cfg.images;
                println!("\nImages:");
                println!("  Large: {}x{}", images.large_max_dimensions.0, images.large_max_dimensions.1);
                println!("  Small: {}x{}", images.small_max_dimensions.0, images.small_max_dimensions.1);
                println!("  Icon: {}x{}", images.icon_max_dimensions.0, images.icon_max_dimensions.1);
                println!("  Quality: {}", images.quality);
                println!("  Force rewrite: {}", images.force_rewrite);
                println!("  Workers: {}", images.workers);

                println!("\nSpelling:");
                println!("  Enabled: {}", cfg.spelling.enabled);
                println!("  System word lists: {}", cfg.spelling.system_dictionaries);
                for dictionary in &cfg.spelling.dictionaries {
                    println!("    - {:?}", dictionary);
                }
                println!("  Extra words: {}", cfg.spelling.extra_words.len());

                println!("\nVocabulary:");
                println!("  Extra mediums: {}", cfg.vocabulary.mediums.join(", "));
                for (bad, good) in &cfg.vocabulary.replacements {
                    println!("  {} -> {}", bad, good);
                }

                let punctuation: String = cfg.validation.terminal_punctuation.iter().collect();
                println!("\nValidation:");
                println!("  Terminal punctuation: {:?}", punctuation);
            }
        }

        Commands::Init { output } => {
            let cfg = PortfolioConfig::default();
            cfg.save(&output)?;
            println!("Created config file: {}", output);
        }

        Commands::Validate { config } => match PortfolioConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                println!("Configuration is valid");
                println!("   Root: {:?}", cfg.content.root);
                println!("   Media: {:?}", cfg.content.media_dir);
                println!("   Workers: {}", cfg.images.workers);
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
