//! Descriptor records read from disk
//!
//! Three kinds of yaml files make up a portfolio: one [`SerializedPortfolioDescription`]
//! at the root, one [`SerializedSectionDescription`] per section directory and one
//! [`SerializedEntry`] per entry directory. Unknown keys are rejected.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PortfolioError, Result};
use crate::validate::{ContentValidator, ValidationReport};

/// Which descriptor a yaml file is expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Entry,
    Section,
    Portfolio,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Entry => write!(f, "SerializedEntry"),
            RecordKind::Section => write!(f, "SerializedSectionDescription"),
            RecordKind::Portfolio => write!(f, "SerializedPortfolioDescription"),
        }
    }
}

/// Descriptor format version. Only `0` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum VersionNumber {
    V0,
}

impl TryFrom<u8> for VersionNumber {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(VersionNumber::V0),
            other => Err(format!("unsupported version_number {}", other)),
        }
    }
}

impl From<VersionNumber> for u8 {
    fn from(value: VersionNumber) -> Self {
        match value {
            VersionNumber::V0 => 0,
        }
    }
}

/// Scope of an entry. Larger entries are displayed larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySize {
    Small,
    Medium,
    Large,
}

impl EntrySize {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySize::Small => "small",
            EntrySize::Medium => "medium",
            EntrySize::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "hardware")]
    Hardware,
    #[serde(rename = "software")]
    Software,
    #[serde(rename = "mixed (hardware, software)")]
    MixedHardwareSoftware,
    #[serde(rename = "social")]
    Social,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Hardware => "hardware",
            Domain::Software => "software",
            Domain::MixedHardwareSoftware => "mixed (hardware, software)",
            Domain::Social => "social",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamSize {
    #[serde(rename = "solo")]
    Solo,
    #[serde(rename = "small group")]
    SmallGroup,
    #[serde(rename = "large group")]
    LargeGroup,
}

impl TeamSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamSize::Solo => "solo",
            TeamSize::SmallGroup => "small group",
            TeamSize::LargeGroup => "large group",
        }
    }
}

/// Media that lives next to the yaml referencing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalMedia {
    /// Short sentence describing the media
    pub label: String,
    /// Relative to the yaml that references it
    pub path: PathBuf,
}

/// A labelled link on the web.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub label: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YouTubeVideo {
    pub label: String,
    pub video_id: String,
}

/// All of the raw data that makes up an entry in the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializedEntry {
    pub version_number: VersionNumber,
    pub title: String,
    /// One or two sentences
    pub description: String,
    /// Three to five sentences, markdown
    pub explanation: String,
    pub featured_media: LocalMedia,
    #[serde(default)]
    pub local_media: Option<Vec<LocalMedia>>,
    #[serde(default)]
    pub youtube_videos: Option<Vec<YouTubeVideo>>,
    pub size: EntrySize,
    pub domain: Domain,
    /// A call to action, ex: "Check out the blog post."
    pub primary_url: Link,
    #[serde(default)]
    pub secondary_urls: Option<Vec<Link>>,
    #[serde(default)]
    pub press_urls: Option<Vec<Link>>,
    /// `YYYY-MM-DD`
    pub completion_date: NaiveDate,
    pub team_size: TeamSize,
    pub involvement: String,
    /// Checked against the medium registry
    pub mediums: Vec<String>,
    pub visible: bool,
}

/// Top level description of a section. Entries are discovered from the
/// directory structure and are not listed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializedSectionDescription {
    pub version_number: VersionNumber,
    pub title: String,
    pub description: String,
    /// CSS color
    pub primary_color: String,
    pub logo: LocalMedia,
    /// Lower ranks are presented first
    pub rank: i64,
}

/// Description of the entire portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializedPortfolioDescription {
    pub version_number: VersionNumber,
    pub title: String,
    pub description: String,
    pub explanation: String,
    pub conclusion: String,
    pub email: String,
    pub contact_urls: Vec<Link>,
    pub header_top_image: LocalMedia,
    pub header_bottom_image: LocalMedia,
    /// Background of the button on top of the entry page
    pub return_image: LocalMedia,
    pub icon: LocalMedia,
    #[serde(default)]
    pub resume_path: Option<PathBuf>,
    pub portrait: LocalMedia,
    #[serde(default)]
    pub header_background: Option<LocalMedia>,
}

/// A record type that can be read from a descriptor yaml
pub trait Descriptor: DeserializeOwned {
    const KIND: RecordKind;

    /// Field-level checks that serde cannot express
    fn validate(&self, validator: &ContentValidator) -> ValidationReport;

    /// Every media path the descriptor references, relative to its yaml
    fn media_paths(&self) -> Vec<&Path>;
}

fn check_media(validator: &ContentValidator, field: &str, media: &LocalMedia, report: &mut ValidationReport) {
    validator.check_sentence(&format!("{}.label", field), &media.label, report);
}

fn check_link(validator: &ContentValidator, field: &str, link: &Link, report: &mut ValidationReport) {
    validator.check_sentence(&format!("{}.label", field), &link.label, report);
    validator.check_url(&format!("{}.link", field), &link.link, report);
}

fn check_links(validator: &ContentValidator, field: &str, links: Option<&[Link]>, report: &mut ValidationReport) {
    for (i, link) in links.unwrap_or_default().iter().enumerate() {
        check_link(validator, &format!("{}[{}]", field, i), link, report);
    }
}

impl Descriptor for SerializedEntry {
    const KIND: RecordKind = RecordKind::Entry;

    fn validate(&self, validator: &ContentValidator) -> ValidationReport {
        let mut report = ValidationReport::default();
        validator.check_sentence("description", &self.description, &mut report);
        validator.check_sentence("explanation", &self.explanation, &mut report);
        validator.check_sentence("involvement", &self.involvement, &mut report);
        check_media(validator, "featured_media", &self.featured_media, &mut report);
        for (i, media) in self.local_media.iter().flatten().enumerate() {
            check_media(validator, &format!("local_media[{}]", i), media, &mut report);
        }
        for (i, video) in self.youtube_videos.iter().flatten().enumerate() {
            validator.check_sentence(&format!("youtube_videos[{}].label", i), &video.label, &mut report);
        }
        check_link(validator, "primary_url", &self.primary_url, &mut report);
        check_links(validator, "secondary_urls", self.secondary_urls.as_deref(), &mut report);
        check_links(validator, "press_urls", self.press_urls.as_deref(), &mut report);
        for (i, medium) in self.mediums.iter().enumerate() {
            validator.check_medium(&format!("mediums[{}]", i), medium, &mut report);
        }
        report
    }

    fn media_paths(&self) -> Vec<&Path> {
        std::iter::once(&self.featured_media)
            .chain(self.local_media.iter().flatten())
            .map(|media| media.path.as_path())
            .collect()
    }
}

impl Descriptor for SerializedSectionDescription {
    const KIND: RecordKind = RecordKind::Section;

    fn validate(&self, validator: &ContentValidator) -> ValidationReport {
        let mut report = ValidationReport::default();
        validator.check_sentence("description", &self.description, &mut report);
        validator.check_color("primary_color", &self.primary_color, &mut report);
        check_media(validator, "logo", &self.logo, &mut report);
        report
    }

    fn media_paths(&self) -> Vec<&Path> {
        vec![self.logo.path.as_path()]
    }
}

impl Descriptor for SerializedPortfolioDescription {
    const KIND: RecordKind = RecordKind::Portfolio;

    fn validate(&self, validator: &ContentValidator) -> ValidationReport {
        let mut report = ValidationReport::default();
        validator.check_sentence("description", &self.description, &mut report);
        validator.check_sentence("explanation", &self.explanation, &mut report);
        validator.check_sentence("conclusion", &self.conclusion, &mut report);
        validator.check_email("email", &self.email, &mut report);
        check_links(validator, "contact_urls", Some(&self.contact_urls), &mut report);
        for (field, media) in [
            ("header_top_image", &self.header_top_image),
            ("header_bottom_image", &self.header_bottom_image),
            ("return_image", &self.return_image),
            ("icon", &self.icon),
            ("portrait", &self.portrait),
        ] {
            check_media(validator, field, media, &mut report);
        }
        if let Some(background) = &self.header_background {
            check_media(validator, "header_background", background, &mut report);
        }
        report
    }

    fn media_paths(&self) -> Vec<&Path> {
        let mut paths = vec![
            self.header_top_image.path.as_path(),
            self.header_bottom_image.path.as_path(),
            self.return_image.path.as_path(),
            self.icon.path.as_path(),
            self.portrait.path.as_path(),
        ];
        paths.extend(self.header_background.iter().map(|media| media.path.as_path()));
        paths.extend(self.resume_path.as_deref());
        paths
    }
}

/// A descriptor that passed validation, along with its advisories
#[derive(Debug)]
pub struct Validated<T> {
    pub record: T,
    pub report: ValidationReport,
}

/// Parse and validate a descriptor, returning the advisories to the caller.
pub fn parse_descriptor<T: Descriptor>(yaml_path: &Path, validator: &ContentValidator) -> Result<Validated<T>> {
    let content = std::fs::read_to_string(yaml_path)?;
    let record: T = serde_yaml::from_str(&content)
        .map_err(|e| PortfolioError::schema(yaml_path, T::KIND, e.to_string()))?;

    let report = record.validate(validator);
    if !report.is_clean() {
        return Err(PortfolioError::schema(yaml_path, T::KIND, report.error_summary()));
    }

    Ok(Validated { record, report })
}

/// Read the yaml file from disk and convert it to the desired structure.
/// Spelling advisories are logged and never fail the read.
pub fn read_portfolio_element<T: Descriptor>(yaml_path: &Path, validator: &ContentValidator) -> Result<T> {
    let validated = parse_descriptor::<T>(yaml_path, validator)?;
    for advisory in &validated.report.advisories {
        warn!(
            file = %yaml_path.display(),
            field = %advisory.field,
            "misspelling? [{}] in [{}]",
            advisory.word,
            advisory.text
        );
    }
    Ok(validated.record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortfolioConfig;
    use tempfile::tempdir;

    const SECTION: &str = r##"
version_number: 0
title: Esologic
description: Projects published on the blog.
primary_color: "#336699"
logo:
  label: The blog logo.
  path: logo.png
rank: 1
"##;

    fn validator() -> ContentValidator {
        ContentValidator::from_config(&PortfolioConfig::default()).unwrap()
    }

    fn write(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("section.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_section() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), SECTION);
        let section: SerializedSectionDescription = read_portfolio_element(&path, &validator()).unwrap();
        assert_eq!(section.rank, 1);
        assert_eq!(section.logo.path, PathBuf::from("logo.png"));
        assert_eq!(section.version_number, VersionNumber::V0);
    }

    #[test]
    fn test_rejects_unknown_key() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), &format!("{}extra: true\n", SECTION));
        let result = read_portfolio_element::<SerializedSectionDescription>(&path, &validator());
        assert!(matches!(
            result,
            Err(PortfolioError::SchemaValidation { kind: RecordKind::Section, .. })
        ));
    }

    #[test]
    fn test_rejects_description_without_period() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), &SECTION.replace("on the blog.", "on the blog"));
        let err = read_portfolio_element::<SerializedSectionDescription>(&path, &validator()).unwrap_err();
        match err {
            PortfolioError::SchemaValidation { path: bad, reason, .. } => {
                assert_eq!(bad, path);
                assert!(reason.contains("description"));
            }
            other => panic!("Expected SchemaValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_version() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), &SECTION.replace("version_number: 0", "version_number: 3"));
        assert!(read_portfolio_element::<SerializedSectionDescription>(&path, &validator()).is_err());
    }

    #[test]
    fn test_rejects_bad_color() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), &SECTION.replace("\"#336699\"", "not-a-color"));
        assert!(read_portfolio_element::<SerializedSectionDescription>(&path, &validator()).is_err());
    }

    #[test]
    fn test_missing_required_field() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), &SECTION.replace("rank: 1\n", ""));
        assert!(read_portfolio_element::<SerializedSectionDescription>(&path, &validator()).is_err());
    }

    #[test]
    fn test_entry_enums_and_date() {
        let yaml = r#"
version_number: 0
title: Tesla Cooler
description: A cooler for beverages.
explanation: It keeps drinks cold.
featured_media:
  label: The cooler.
  path: cooler.jpg
size: large
domain: mixed (hardware, software)
primary_url:
  label: Read the blog post.
  link: https://esologic.com/tesla-cooler
completion_date: 2021-06-15
team_size: small group
involvement: I built all of it.
mediums:
  - 3d printer
  - pcb electronics
visible: true
"#;
        let entry: SerializedEntry = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entry.domain, Domain::MixedHardwareSoftware);
        assert_eq!(entry.team_size, TeamSize::SmallGroup);
        assert_eq!(entry.size, EntrySize::Large);
        assert_eq!(entry.completion_date, NaiveDate::from_ymd_opt(2021, 6, 15).unwrap());
        assert!(entry.validate(&validator()).is_clean());

        let bad_date = yaml.replace("2021-06-15", "15/06/2021");
        assert!(serde_yaml::from_str::<SerializedEntry>(&bad_date).is_err());

        let bad_domain = yaml.replace("mixed (hardware, software)", "culinary");
        assert!(serde_yaml::from_str::<SerializedEntry>(&bad_domain).is_err());
    }
}
