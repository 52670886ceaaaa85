//! Rendered portfolio records
//!
//! Everything here is ready for a template: text is normalized, markdown is
//! already HTML and media paths point at the rendered copies. Entries live in a
//! single arena on [`Portfolio`]; neighbors and section membership are
//! [`EntryId`]s into it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::images::RenderedLocalMedia;
use crate::markdown::render_markdown;
use crate::schema::{Link, YouTubeVideo};

/// Index of an entry in [`Portfolio::entries`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub usize);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLink {
    pub label: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedYouTubeVideo {
    /// HTML
    pub label: String,
    pub video_id: String,
}

/// A portfolio entry after normalization. Capitalization and acronym
/// fix-ups are done; this is the "pretty" version of the yaml.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedEntry {
    /// Entry directory name without extension
    pub slug: String,
    pub title: String,
    pub description: String,
    /// HTML
    pub explanation: String,
    pub featured_media: RenderedLocalMedia,
    pub local_media: Option<Vec<RenderedLocalMedia>>,
    pub youtube_videos: Option<Vec<RenderedYouTubeVideo>>,
    pub size: String,
    pub domain: String,
    pub primary_url: RenderedLink,
    pub secondary_urls: Option<Vec<RenderedLink>>,
    pub press_urls: Option<Vec<RenderedLink>>,
    pub completion_date: NaiveDate,
    /// "June of 2021"
    pub completion_date_verbose: String,
    /// "2021"
    pub completion_year: String,
    pub team_size: String,
    pub involvement: String,
    pub mediums: Vec<String>,
    /// Inherited from the section
    pub primary_color: String,
    pub favicon_path: String,
    /// Shared by every entry
    pub top_image: Arc<RenderedLocalMedia>,
    pub visible: bool,

    // Filled once the whole portfolio is ordered
    pub previous_entry: Option<EntryId>,
    pub next_entry: Option<EntryId>,
}

/// A section of the portfolio. Ex: Telapush, esologic
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub title: String,
    /// HTML
    pub description: String,
    /// Visible entries, newest first
    pub entries: Vec<EntryId>,
    pub primary_color: String,
    pub logo: RenderedLocalMedia,
    pub rank: i64,
}

/// The whole portfolio, as handed to the templates.
#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub title: String,
    /// HTML
    pub description: String,
    /// HTML
    pub explanation: String,
    /// HTML
    pub conclusion: String,
    /// Ordered by rank
    pub sections: Vec<Section>,
    /// Every entry, hidden ones included, in section then date order
    pub entries: Vec<RenderedEntry>,
    pub contact_urls: Vec<RenderedLink>,
    pub email: String,
    pub header_top_image: RenderedLocalMedia,
    pub header_bottom_image: RenderedLocalMedia,
    pub icon: RenderedLocalMedia,
    /// Relative to the media directory
    pub resume_path: Option<String>,
    pub portrait: RenderedLocalMedia,
    pub header_background: Option<RenderedLocalMedia>,
    #[serde(skip)]
    pub(crate) by_slug: HashMap<String, EntryId>,
}

impl Portfolio {
    pub fn entry(&self, id: EntryId) -> Option<&RenderedEntry> {
        self.entries.get(id.0)
    }

    pub fn entry_by_slug(&self, slug: &str) -> Option<&RenderedEntry> {
        self.by_slug.get(slug).and_then(|id| self.entry(*id))
    }

    /// Previous and next entries of `entry`. Either may be hidden.
    pub fn neighbors(&self, entry: &RenderedEntry) -> (Option<&RenderedEntry>, Option<&RenderedEntry>) {
        (
            entry.previous_entry.and_then(|id| self.entry(id)),
            entry.next_entry.and_then(|id| self.entry(id)),
        )
    }

    /// The visible entries of a section, in display order
    pub fn section_entries<'a>(&'a self, section: &'a Section) -> impl Iterator<Item = &'a RenderedEntry> + 'a {
        section.entries.iter().filter_map(move |id| self.entry(*id))
    }

    /// Every visible entry across all sections
    pub fn visible_entries(&self) -> impl Iterator<Item = &RenderedEntry> + '_ {
        self.sections.iter().flat_map(move |s| self.section_entries(s))
    }
}

pub fn render_link(link: &Link) -> RenderedLink {
    RenderedLink {
        label: link.label.clone(),
        link: link.link.clone(),
    }
}

pub fn render_link_list(links: Option<&[Link]>) -> Option<Vec<RenderedLink>> {
    match links {
        Some(links) if !links.is_empty() => Some(links.iter().map(render_link).collect()),
        _ => None,
    }
}

pub fn render_video(video: &YouTubeVideo) -> RenderedYouTubeVideo {
    RenderedYouTubeVideo {
        label: render_markdown(&video.label),
        video_id: video.video_id.clone(),
    }
}

/// Canonical display of a completion date: "June of 2021" or "2021"
pub fn render_date(date: NaiveDate, verbose: bool) -> String {
    if verbose {
        date.format("%B of %Y").to_string()
    } else {
        date.format("%Y").to_string()
    }
}

/// Title-cases text: a letter is uppercased when it follows a non-letter
/// and lowercased otherwise.
pub fn capitalize(text: &str) -> String {
    let mut previous_is_letter = false;
    text.chars()
        .flat_map(|c| {
            let out: Vec<char> = if previous_is_letter {
                c.to_lowercase().collect()
            } else {
                c.to_uppercase().collect()
            };
            previous_is_letter = c.is_alphabetic();
            out
        })
        .collect()
}

/// Capitalizes, applies the replacement table word by word, sorts and dedups.
pub fn render_mediums(mediums: &[String], replacements: &[(String, String)]) -> Vec<String> {
    let mut rendered: Vec<String> = mediums
        .iter()
        .map(|medium| {
            capitalize(medium)
                .split(' ')
                .map(|word| {
                    replacements
                        .iter()
                        .find(|(bad, _)| bad == word)
                        .map(|(_, good)| good.as_str())
                        .unwrap_or(word)
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    rendered.sort();
    rendered.dedup();
    rendered
}
