//! Portfolio discovery
//!
//! Walks the content tree, validates every descriptor, renders media and
//! assembles the [`Portfolio`]. The layout is fixed:
//!
//! ```text
//! root/
//!   portfolio.yaml
//!   <section>/
//!     section.yaml
//!     <entry>/
//!       entry.yaml
//! ```
//!
//! Each directory holds exactly one `.yaml` file. Subdirectories are visited in
//! file name order so repeated runs see the same input order.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ImagesConfig;
use crate::content::{
    capitalize, render_date, render_link, render_link_list, render_mediums, render_video, EntryId, Portfolio,
    RenderedEntry, Section,
};
use crate::error::{PortfolioError, Result};
use crate::images::{render_local_media, render_media_list, resolve_media_path, ImageSizes, RenderedLocalMedia};
use crate::markdown::render_markdown;
use crate::schema::{
    parse_descriptor, read_portfolio_element, Descriptor, LocalMedia, RecordKind, SerializedEntry,
    SerializedPortfolioDescription, SerializedSectionDescription,
};
use crate::validate::{normalize_color, ContentValidator, SpellingAdvisory};

/// Extension of descriptor files. `.yml` is not recognized.
pub const YAML_EXTENSION: &str = "yaml";

/// Output name of the portfolio favicon
pub const PORTFOLIO_ICON_NAME: &str = "portfolio_icon.png";

/// Finds the single descriptor in `directory`.
pub fn find_yaml(directory: &Path) -> Result<PathBuf> {
    let mut found: Vec<PathBuf> = children(directory)?
        .into_iter()
        .filter(|path| path.is_file() && path.extension().map(|x| x == YAML_EXTENSION).unwrap_or(false))
        .collect();

    if found.len() != 1 {
        return Err(PortfolioError::DirectoryStructure {
            directory: directory.to_path_buf(),
            found: found.len(),
        });
    }
    Ok(found.remove(0))
}

/// Immediate subdirectories of `directory`, sorted by name.
pub fn directories_in_directory(directory: &Path) -> Result<Vec<PathBuf>> {
    Ok(children(directory)?.into_iter().filter(|path| path.is_dir()).collect())
}

fn children(directory: &Path) -> Result<Vec<PathBuf>> {
    WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.map(|e| e.into_path()).map_err(std::io::Error::from))
        .collect::<std::result::Result<Vec<_>, std::io::Error>>()
        .map_err(PortfolioError::from)
}

/// Entry slug: the entry directory name without extension
fn slug_of(entry_directory: &Path) -> String {
    entry_directory
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// An entry before neighbors are assigned, with the descriptor it came from
struct DiscoveredEntry {
    entry: RenderedEntry,
    yaml_path: PathBuf,
}

/// A section before its entries are moved into the arena
struct DiscoveredSection {
    title: String,
    description: String,
    entries: Vec<DiscoveredEntry>,
    primary_color: String,
    logo: RenderedLocalMedia,
    rank: i64,
}

/// State shared by one discovery run
struct Discovery<'a> {
    media_directory: &'a Path,
    sizes: ImageSizes,
    validator: &'a ContentValidator,
    pool: rayon::ThreadPool,
}

impl<'a> Discovery<'a> {
    fn new(media_directory: &'a Path, images: &ImagesConfig, validator: &'a ContentValidator) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(images.workers)
            .thread_name(|i| format!("media-{}", i))
            .build()?;
        Ok(Self {
            media_directory,
            sizes: ImageSizes::from(images),
            validator,
            pool,
        })
    }

    fn read_entry(
        &self,
        entry_directory: &Path,
        primary_color: &str,
        top_image: &Arc<RenderedLocalMedia>,
    ) -> Result<DiscoveredEntry> {
        let yaml_path = find_yaml(entry_directory)?;
        let serialized: SerializedEntry = read_portfolio_element(&yaml_path, self.validator)?;
        let slug = slug_of(entry_directory);
        debug!(slug = %slug, file = %yaml_path.display(), "Reading entry");

        let local_media = serialized
            .local_media
            .as_deref()
            .map(|media| render_media_list(&self.pool, self.media_directory, &yaml_path, &self.sizes.large, media))
            .transpose()?;

        let featured_media = render_local_media(
            self.media_directory,
            &yaml_path,
            None,
            &self.sizes.large,
            &serialized.featured_media,
        )?;

        let favicon = render_local_media(
            self.media_directory,
            &yaml_path,
            Some(&format!("{}_icon.png", slug)),
            &self.sizes.icon,
            &serialized.featured_media,
        )?;

        let entry = RenderedEntry {
            title: serialized.title,
            description: serialized.description,
            explanation: render_markdown(&serialized.explanation),
            featured_media,
            local_media,
            youtube_videos: serialized
                .youtube_videos
                .as_ref()
                .map(|videos| videos.iter().map(render_video).collect()),
            size: serialized.size.as_str().to_string(),
            domain: capitalize(serialized.domain.as_str()),
            primary_url: render_link(&serialized.primary_url),
            secondary_urls: render_link_list(serialized.secondary_urls.as_deref()),
            press_urls: render_link_list(serialized.press_urls.as_deref()),
            completion_date: serialized.completion_date,
            completion_date_verbose: render_date(serialized.completion_date, true),
            completion_year: render_date(serialized.completion_date, false),
            team_size: capitalize(serialized.team_size.as_str()),
            involvement: serialized.involvement,
            mediums: render_mediums(&serialized.mediums, self.validator.mediums().replacements()),
            primary_color: primary_color.to_string(),
            favicon_path: favicon.path,
            top_image: Arc::clone(top_image),
            visible: serialized.visible,
            previous_entry: None,
            next_entry: None,
            slug,
        };

        Ok(DiscoveredEntry { entry, yaml_path })
    }

    fn read_section(&self, section_directory: &Path, top_image: &Arc<RenderedLocalMedia>) -> Result<DiscoveredSection> {
        let yaml_path = find_yaml(section_directory)?;
        let description: SerializedSectionDescription = read_portfolio_element(&yaml_path, self.validator)?;
        let primary_color = normalize_color(&description.primary_color);

        let logo = render_local_media(
            self.media_directory,
            &yaml_path,
            None,
            &self.sizes.small,
            &description.logo,
        )?;

        let mut entries = directories_in_directory(section_directory)?
            .iter()
            .map(|entry_directory| self.read_entry(entry_directory, &primary_color, top_image))
            .collect::<Result<Vec<_>>>()?;

        // Newest first; stable for equal dates
        entries.sort_by(|a, b| b.entry.completion_date.cmp(&a.entry.completion_date));

        info!(section = %description.title, entries = entries.len(), "Read section");

        Ok(DiscoveredSection {
            title: description.title,
            description: render_markdown(&description.description),
            entries,
            primary_color,
            logo,
            rank: description.rank,
        })
    }

    fn copy_resume(&self, yaml_path: &Path, resume_path: &Path) -> Result<String> {
        let source = resolve_media_path(yaml_path, resume_path);
        if !source.is_file() {
            return Err(PortfolioError::MediaSourceMissing { path: source });
        }
        let name = match source.extension() {
            Some(extension) => format!("resume.{}", extension.to_string_lossy()),
            None => "resume".to_string(),
        };
        fs::copy(&source, self.media_directory.join(&name))?;
        debug!(source = %source.display(), output = %name, "Copied resume");
        Ok(name)
    }
}

/// Moves every section's entries into one arena, links neighbors across the
/// whole sequence and keeps only visible entries in the sections.
fn assemble(sections: Vec<DiscoveredSection>) -> Result<(Vec<Section>, Vec<RenderedEntry>, HashMap<String, EntryId>)> {
    let mut arena: Vec<RenderedEntry> = Vec::new();
    let mut sources: Vec<PathBuf> = Vec::new();
    let mut by_slug: HashMap<String, EntryId> = HashMap::new();
    let mut assembled = Vec::with_capacity(sections.len());

    for section in sections {
        let mut members = Vec::with_capacity(section.entries.len());
        for discovered in section.entries {
            let id = EntryId(arena.len());
            if let Some(existing) = by_slug.insert(discovered.entry.slug.clone(), id) {
                return Err(PortfolioError::DuplicateSlug {
                    slug: discovered.entry.slug,
                    first: sources[existing.0].clone(),
                    second: discovered.yaml_path,
                });
            }
            if discovered.entry.visible {
                members.push(id);
            }
            arena.push(discovered.entry);
            sources.push(discovered.yaml_path);
        }
        assembled.push(Section {
            title: section.title,
            description: section.description,
            entries: members,
            primary_color: section.primary_color,
            logo: section.logo,
            rank: section.rank,
        });
    }

    // Neighbors span the full sequence, hidden entries included
    let count = arena.len();
    for (index, entry) in arena.iter_mut().enumerate() {
        entry.previous_entry = index.checked_sub(1).map(EntryId);
        entry.next_entry = (index + 1 < count).then(|| EntryId(index + 1));
    }

    Ok((assembled, arena, by_slug))
}

/// Read the portfolio content directory and render it.
///
/// Media outputs are written to `media_directory`, which is created if needed.
pub fn discover_portfolio(
    sections_directory: &Path,
    media_directory: &Path,
    images: &ImagesConfig,
    validator: &ContentValidator,
) -> Result<Portfolio> {
    info!(root = %sections_directory.display(), media = %media_directory.display(), "Discovering portfolio");
    fs::create_dir_all(media_directory)?;

    let discovery = Discovery::new(media_directory, images, validator)?;

    let yaml_path = find_yaml(sections_directory)?;
    let description: SerializedPortfolioDescription = read_portfolio_element(&yaml_path, validator)?;

    let top_image = Arc::new(render_local_media(
        media_directory,
        &yaml_path,
        None,
        &discovery.sizes.small,
        &description.return_image,
    )?);

    let mut sections = directories_in_directory(sections_directory)?
        .iter()
        .map(|section_directory| discovery.read_section(section_directory, &top_image))
        .collect::<Result<Vec<_>>>()?;
    sections.sort_by_key(|section| section.rank);

    let (sections, entries, by_slug) = assemble(sections)?;

    let resume_path = description
        .resume_path
        .as_deref()
        .map(|resume| discovery.copy_resume(&yaml_path, resume))
        .transpose()?;

    let large = |media: &LocalMedia| render_local_media(media_directory, &yaml_path, None, &discovery.sizes.large, media);

    let portfolio = Portfolio {
        title: description.title.clone(),
        description: render_markdown(&description.description),
        explanation: render_markdown(&description.explanation),
        conclusion: render_markdown(&description.conclusion),
        sections,
        entries,
        contact_urls: description.contact_urls.iter().map(render_link).collect(),
        email: description.email.clone(),
        header_top_image: large(&description.header_top_image)?,
        header_bottom_image: large(&description.header_bottom_image)?,
        icon: render_local_media(
            media_directory,
            &yaml_path,
            Some(PORTFOLIO_ICON_NAME),
            &discovery.sizes.icon,
            &description.icon,
        )?,
        resume_path,
        portrait: large(&description.portrait)?,
        header_background: description.header_background.as_ref().map(large).transpose()?,
        by_slug,
    };

    info!(
        sections = portfolio.sections.len(),
        entries = portfolio.entries.len(),
        visible = portfolio.visible_entries().count(),
        "Portfolio discovered"
    );

    Ok(portfolio)
}

/// Lint findings for one descriptor
#[derive(Debug, Serialize)]
pub struct DescriptorReport {
    pub path: PathBuf,
    pub kind: RecordKind,
    pub errors: Vec<String>,
    pub advisories: Vec<SpellingAdvisory>,
}

impl DescriptorReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_advisories(&self) -> bool {
        !self.advisories.is_empty()
    }
}

fn lint_descriptor<T: Descriptor>(yaml_path: &Path, validator: &ContentValidator) -> Result<DescriptorReport> {
    let mut report = DescriptorReport {
        path: yaml_path.to_path_buf(),
        kind: T::KIND,
        errors: Vec::new(),
        advisories: Vec::new(),
    };

    match parse_descriptor::<T>(yaml_path, validator) {
        Ok(validated) => {
            for media in validated.record.media_paths() {
                let source = resolve_media_path(yaml_path, media);
                if !source.is_file() {
                    report.errors.push(format!("missing media: {}", source.display()));
                }
            }
            report.advisories = validated.report.advisories;
        }
        Err(PortfolioError::SchemaValidation { reason, .. }) => report.errors.push(reason),
        Err(e) => return Err(e),
    }

    Ok(report)
}

/// Checks every descriptor without rendering anything.
///
/// Unlike [`discover_portfolio`] this keeps going past invalid descriptors so
/// one run reports all of them. Layout problems still abort.
pub fn lint_portfolio(sections_directory: &Path, validator: &ContentValidator) -> Result<Vec<DescriptorReport>> {
    let mut reports = Vec::new();
    reports.push(lint_descriptor::<SerializedPortfolioDescription>(
        &find_yaml(sections_directory)?,
        validator,
    )?);

    for section_directory in directories_in_directory(sections_directory)? {
        reports.push(lint_descriptor::<SerializedSectionDescription>(
            &find_yaml(&section_directory)?,
            validator,
        )?);
        for entry_directory in directories_in_directory(&section_directory)? {
            reports.push(lint_descriptor::<SerializedEntry>(&find_yaml(&entry_directory)?, validator)?);
        }
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortfolioConfig;
    use tempfile::TempDir;

    fn validator() -> ContentValidator {
        ContentValidator::from_config(&PortfolioConfig::default()).unwrap()
    }

    #[test]
    fn test_find_yaml_single() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("entry.yaml"), "title: x").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("other.yml"), "ignored").unwrap();

        assert_eq!(find_yaml(dir.path()).unwrap(), dir.path().join("entry.yaml"));
    }

    #[test]
    fn test_find_yaml_none_or_many() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            find_yaml(dir.path()),
            Err(PortfolioError::DirectoryStructure { found: 0, .. })
        ));

        fs::write(dir.path().join("a.yaml"), "").unwrap();
        fs::write(dir.path().join("b.yaml"), "").unwrap();
        assert!(matches!(
            find_yaml(dir.path()),
            Err(PortfolioError::DirectoryStructure { found: 2, .. })
        ));
    }

    #[test]
    fn test_directories_sorted_and_files_skipped() {
        let dir = TempDir::new().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("portfolio.yaml"), "").unwrap();

        let names: Vec<String> = directories_in_directory(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_slug_is_directory_stem() {
        assert_eq!(slug_of(Path::new("/content/esologic/pi_power")), "pi_power");
        assert_eq!(slug_of(Path::new("/content/esologic/v2.final")), "v2");
    }

    #[test]
    fn test_lint_reports_schema_errors_and_continues() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("portfolio.yaml"), "version_number: 0\ntitle: Missing most fields\n").unwrap();

        let section = root.join("esologic");
        fs::create_dir(&section).unwrap();
        fs::write(
            section.join("section.yaml"),
            "version_number: 0\n\
             title: Esologic\n\
             description: My blog about making things\n\
             primary_color: \"#ff0000\"\n\
             logo:\n  label: The logo.\n  path: ./logo.png\n\
             rank: 1\n",
        )
        .unwrap();

        let reports = lint_portfolio(root, &validator()).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].kind, RecordKind::Portfolio);
        assert!(!reports[0].is_clean());

        assert_eq!(reports[1].kind, RecordKind::Section);
        assert!(reports[1].errors.iter().any(|e| e.contains("description")));
    }

    #[test]
    fn test_lint_reports_missing_media() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(
            root.join("section.yaml"),
            "version_number: 0\n\
             title: Esologic\n\
             description: My blog about making things.\n\
             primary_color: \"#ff0000\"\n\
             logo:\n  label: The logo.\n  path: ./logo.png\n\
             rank: 1\n",
        )
        .unwrap();

        let report = lint_descriptor::<SerializedSectionDescription>(&root.join("section.yaml"), &validator()).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("missing media"));
    }
}
