//! Error types for the portfolio content pipeline

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::RecordKind;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Portfolio pipeline errors
///
/// Every variant aborts the discovery run; there is no partial portfolio.
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Expected exactly one yaml descriptor in {directory}, found {found}")]
    DirectoryStructure { directory: PathBuf, found: usize },

    #[error("Couldn't validate to schema: {kind} file: {path}: {reason}")]
    SchemaValidation {
        path: PathBuf,
        kind: RecordKind,
        reason: String,
    },

    #[error("Media source not found: {path}")]
    MediaSourceMissing { path: PathBuf },

    #[error("Duplicate entry slug '{slug}': {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Image error in {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl PortfolioError {
    pub(crate) fn schema(path: impl Into<PathBuf>, kind: RecordKind, reason: impl Into<String>) -> Self {
        Self::SchemaValidation {
            path: path.into(),
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}
