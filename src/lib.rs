//! Portfolio Content Pipeline
//!
//! Turns a directory of hand-written yaml descriptors into a validated,
//! rendered [`Portfolio`] ready for a static site generator.
//!
//! ## Features
//!
//! - **Strict Schemas**: Unknown fields, bad enums and unpunctuated sentences are rejected
//! - **Advisory Spelling**: Unknown words are logged, never fatal
//! - **Media Rendering**: Images are resized into a media directory and reused across runs
//! - **Markdown**: Long-form fields become HTML with links opening in a new tab
//! - **Ordering**: Sections by rank, entries newest first, neighbors across the whole portfolio
//!
//! ## Layout
//!
//! ```text
//! portfolio_content/
//! ├── portfolio.yaml
//! ├── esologic/
//! │   ├── section.yaml
//! │   ├── logo.png
//! │   ├── pi_power/
//! │   │   ├── entry.yaml
//! │   │   └── featured.jpg
//! │   └── ...
//! └── telapush/
//! ```

pub mod config;
pub mod content;
pub mod discovery;
pub mod error;
pub mod images;
pub mod markdown;
pub mod schema;
pub mod validate;

pub use config::PortfolioConfig;
pub use content::{EntryId, Portfolio, RenderedEntry, Section};
pub use discovery::{discover_portfolio, lint_portfolio, DescriptorReport};
pub use error::{PortfolioError, Result};
pub use images::{ImageConfig, ImageSizes, RenderedLocalMedia};
pub use schema::{RecordKind, SerializedEntry, SerializedPortfolioDescription, SerializedSectionDescription};
pub use validate::{ContentValidator, Dictionary, MediumRegistry, ValidationReport};
