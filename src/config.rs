//! Configuration management for the portfolio pipeline
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (portfolio.toml)
//! - Environment variables (PORTFOLIO__*)
//!
//! ## Example config file (portfolio.toml):
//! ```toml
//! [content]
//! root = "./portfolio_content"
//! media_dir = "./static"
//!
//! [images]
//! large_max_dimensions = [1500, 1500]
//! quality = 85
//! force_rewrite = false
//! workers = 5
//!
//! [spelling]
//! system_dictionaries = true
//! dictionaries = ["./words/hardware.txt"]
//! extra_words = ["esologic", "telapush"]
//!
//! [vocabulary]
//! mediums = ["woodworking"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// Where content is read from and media written to
    #[serde(default)]
    pub content: ContentConfig,

    /// Image size profiles
    #[serde(default)]
    pub images: ImagesConfig,

    /// Advisory spell-checking
    #[serde(default)]
    pub spelling: SpellingConfig,

    /// Medium tag registry and display fix-ups
    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    /// Sentence rules
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Content locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory containing the portfolio yaml and the section directories
    #[serde(default = "default_content_root")]
    pub root: PathBuf,

    /// Rendered media is written here
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
}

/// Describes how images are to be modified for inclusion in the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Portrait, entry media, headers
    #[serde(default = "default_large")]
    pub large_max_dimensions: (u32, u32),

    /// Back button, section logos
    #[serde(default = "default_small")]
    pub small_max_dimensions: (u32, u32),

    /// Favicons
    #[serde(default = "default_icon")]
    pub icon_max_dimensions: (u32, u32),

    /// Encoder quality, used by lossy formats
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Re-create every image even if the output already exists
    #[serde(default)]
    pub force_rewrite: bool,

    /// Size of the gallery worker pool
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Spelling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Also load the distribution word lists under /usr/share/dict
    #[serde(default = "default_true")]
    pub system_dictionaries: bool,

    /// Newline separated word lists loaded on top of the built-in list
    #[serde(default)]
    pub dictionaries: Vec<PathBuf>,

    #[serde(default)]
    pub extra_words: Vec<String>,
}

/// Vocabulary configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Medium tags accepted in addition to the built-in registry
    #[serde(default)]
    pub mediums: Vec<String>,

    /// Word replacements applied after title-casing medium tags
    #[serde(default = "default_replacements")]
    pub replacements: Vec<(String, String)>,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Sentence fields must end with one of these characters
    #[serde(default = "default_terminal_punctuation")]
    pub terminal_punctuation: Vec<char>,
}

// Default value functions
fn default_content_root() -> PathBuf {
    PathBuf::from("portfolio_content")
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_large() -> (u32, u32) {
    (1500, 1500)
}

fn default_small() -> (u32, u32) {
    (500, 500)
}

fn default_icon() -> (u32, u32) {
    (100, 100)
}

fn default_quality() -> u8 {
    85
}

fn default_workers() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_replacements() -> Vec<(String, String)> {
    [("3d", "3D"), ("Cad", "CAD"), ("Led", "LED"), ("Pcb", "PCB")]
        .into_iter()
        .map(|(bad, good)| (bad.to_string(), good.to_string()))
        .collect()
}

fn default_terminal_punctuation() -> Vec<char> {
    vec!['.']
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_content_root(),
            media_dir: default_media_dir(),
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            large_max_dimensions: default_large(),
            small_max_dimensions: default_small(),
            icon_max_dimensions: default_icon(),
            quality: default_quality(),
            force_rewrite: false,
            workers: default_workers(),
        }
    }
}

impl Default for SpellingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            system_dictionaries: true,
            dictionaries: Vec::new(),
            extra_words: Vec::new(),
        }
    }
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            mediums: Vec::new(),
            replacements: default_replacements(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            terminal_punctuation: default_terminal_punctuation(),
        }
    }
}

impl PortfolioConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "portfolio.toml",
            ".portfolio.toml",
            "config/portfolio.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "portfolio", "portfolio-content") {
            let xdg_config = config_dir.config_dir().join("portfolio.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // PORTFOLIO__IMAGES__FORCE_REWRITE=true
        builder = builder.add_source(
            Environment::with_prefix("PORTFOLIO")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let images = &self.images;
        if !(1..=100).contains(&images.quality) {
            return Err(ConfigError::Message(format!(
                "images.quality must be in 1..=100, got {}",
                images.quality
            )));
        }
        for (name, (width, height)) in [
            ("large_max_dimensions", images.large_max_dimensions),
            ("small_max_dimensions", images.small_max_dimensions),
            ("icon_max_dimensions", images.icon_max_dimensions),
        ] {
            if width == 0 || height == 0 {
                return Err(ConfigError::Message(format!(
                    "images.{} must be non-zero, got {}x{}",
                    name, width, height
                )));
            }
        }
        if images.workers == 0 {
            return Err(ConfigError::Message("images.workers must be > 0".to_string()));
        }
        if self.validation.terminal_punctuation.is_empty() {
            return Err(ConfigError::Message(
                "validation.terminal_punctuation must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
