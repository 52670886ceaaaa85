//! Field-level content rules
//!
//! Descriptor text is held to a few rules that serde cannot express:
//! 1. **Sentences**: descriptions, explanations and labels end in terminal punctuation
//! 2. **Vocabulary**: medium tags come from a registry (built-in + config)
//! 3. **Formats**: links are absolute http(s) URLs, colors are CSS colors, emails look like emails
//! 4. **Spelling**: unknown words are reported as advisories and never fail validation

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use regex::Regex;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::{PortfolioConfig, VocabularyConfig};
use crate::error::Result;

const BUILTIN_WORDS: &str = include_str!("../assets/words.txt");

/// Word lists installed by common distributions (the `words` and
/// `wamerican`/`wbritish` packages). Loaded when present.
pub const SYSTEM_WORD_LISTS: &[&str] = &[
    "/usr/share/dict/words",
    "/usr/share/dict/american-english",
    "/usr/share/dict/british-english",
];

/// Medium tags every portfolio understands.
pub const BUILTIN_MEDIUMS: &[&str] = &[
    "laser cutter",
    "3d printer",
    "arduino",
    "fritzing",
    "breadboard electronics",
    "protoboard electronics",
    "pcb electronics",
    "electrical cad",
    "mechanical cad",
    "c#",
    "python",
    "raspberry pi",
    "led art",
    "twitter",
    "frontend web development",
    "photography",
    "events",
    "apparel",
    "artificial intelligence",
];

const CSS_NAMED_COLORS: &[&str] = &[
    "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
    "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
    "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue",
    "darkcyan", "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki",
    "darkmagenta", "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon",
    "darkseagreen", "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise",
    "darkviolet", "deeppink", "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick",
    "floralwhite", "forestgreen", "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod",
    "gray", "green", "greenyellow", "grey", "honeydew", "hotpink", "indianred", "indigo",
    "ivory", "khaki", "lavender", "lavenderblush", "lawngreen", "lemonchiffon", "lightblue",
    "lightcoral", "lightcyan", "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey",
    "lightpink", "lightsalmon", "lightseagreen", "lightskyblue", "lightslategray",
    "lightslategrey", "lightsteelblue", "lightyellow", "lime", "limegreen", "linen", "magenta",
    "maroon", "mediumaquamarine", "mediumblue", "mediumorchid", "mediumpurple",
    "mediumseagreen", "mediumslateblue", "mediumspringgreen", "mediumturquoise",
    "mediumvioletred", "midnightblue", "mintcream", "mistyrose", "moccasin", "navajowhite",
    "navy", "oldlace", "olive", "olivedrab", "orange", "orangered", "orchid", "palegoldenrod",
    "palegreen", "paleturquoise", "palevioletred", "papayawhip", "peachpuff", "peru", "pink",
    "plum", "powderblue", "purple", "rebeccapurple", "red", "rosybrown", "royalblue",
    "saddlebrown", "salmon", "sandybrown", "seagreen", "seashell", "sienna", "silver",
    "skyblue", "slateblue", "slategray", "slategrey", "snow", "springgreen", "steelblue", "tan",
    "teal", "thistle", "tomato", "turquoise", "violet", "wheat", "white", "whitesmoke",
    "yellow", "yellowgreen",
];

/// A rule violation that fails validation
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub code: &'static str,
    pub field: String,
    pub message: String,
}

/// A word the dictionary didn't recognize
#[derive(Debug, Clone, Serialize)]
pub struct SpellingAdvisory {
    pub field: String,
    pub word: String,
    pub text: String,
}

/// Result of validating one descriptor
#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub advisories: Vec<SpellingAdvisory>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_advisories(&self) -> bool {
        !self.advisories.is_empty()
    }

    /// One line per error, used as the reason of a schema error
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|issue| format!("{} ({}): {}", issue.field, issue.code, issue.message))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn error(&mut self, code: &'static str, field: &str, message: String) {
        self.errors.push(ValidationIssue {
            code,
            field: field.to_string(),
            message,
        });
    }
}

/// Cleans up a piece of text and returns its words for spell checking.
///
/// Punctuation is deleted except `-` and `/`, which become spaces.
pub fn clean_and_split(value: &str) -> Vec<String> {
    let cleaned: String = value
        .chars()
        .filter_map(|c| match c {
            '-' | '/' => Some(' '),
            c if c.is_ascii_punctuation() => None,
            c => Some(c),
        })
        .collect();

    cleaned
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Words of a word list file; `#` lines are comments.
fn word_list(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .flat_map(str::split_whitespace)
}

/// Suffix rewrites that map an inflected word onto a candidate base form
const INFLECTIONS: &[(&str, &str)] = &[
    ("ies", "y"),
    ("ied", "y"),
    ("ier", "y"),
    ("iest", "y"),
    ("ily", "y"),
    ("es", ""),
    ("s", ""),
    ("ed", ""),
    ("ed", "e"),
    ("ing", ""),
    ("ing", "e"),
    ("ly", ""),
    ("ly", "le"),
    ("er", ""),
    ("er", "e"),
    ("est", ""),
    ("est", "e"),
    ("ness", ""),
    ("ment", ""),
    ("able", ""),
    ("able", "e"),
];

/// Candidate base forms of `word`: "batteries" gives "battery", "planned"
/// gives "plann" and "plan".
fn stems(word: &str) -> Vec<String> {
    let mut stems = Vec::new();
    for (suffix, replacement) in INFLECTIONS {
        let Some(stem) = word.strip_suffix(suffix) else { continue };
        if stem.len() < 2 {
            continue;
        }
        stems.push(format!("{}{}", stem, replacement));

        // Doubled final consonant: "soldered" is regular, "planned" is not
        let bytes = stem.as_bytes();
        let last = bytes[bytes.len() - 1];
        if replacement.is_empty()
            && bytes.len() >= 3
            && last == bytes[bytes.len() - 2]
            && last.is_ascii_alphabetic()
            && !b"aeiou".contains(&last)
        {
            stems.push(stem[..stem.len() - 1].to_string());
        }
    }
    stems
}

/// Word list used for spelling advisories
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: HashSet<String>,
}

impl Dictionary {
    /// The word list shipped with the crate
    pub fn builtin() -> Self {
        Self::from_words(word_list(BUILTIN_WORDS))
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Self::default();
        dictionary.extend(words);
        dictionary
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
    }

    /// Add every line of a word list file
    pub fn extend_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        self.extend(word_list(&content));
        Ok(())
    }

    /// Whether `word`, or a base form of it, is known.
    ///
    /// Regular inflections are undone up to two levels deep, so "builders"
    /// is found through "builder" and "build".
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
            || stems(word)
                .iter()
                .any(|stem| self.words.contains(stem) || stems(stem).iter().any(|s| self.words.contains(s)))
    }

    /// Words that are not in the dictionary. Numbers are never flagged.
    pub fn unknown<'a>(&self, words: &'a [String]) -> BTreeSet<&'a str> {
        words
            .iter()
            .map(String::as_str)
            .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
            .filter(|w| !self.contains(w))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Controlled vocabulary of medium tags. Growing it is a config change.
#[derive(Debug, Clone)]
pub struct MediumRegistry {
    mediums: BTreeSet<String>,
    /// Display fix-ups applied word by word after title-casing
    replacements: Vec<(String, String)>,
}

impl Default for MediumRegistry {
    fn default() -> Self {
        Self::with_extra(std::iter::empty::<&str>())
    }
}

impl MediumRegistry {
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mediums = BUILTIN_MEDIUMS
            .iter()
            .map(|m| m.to_string())
            .chain(extra.into_iter().map(|m| m.as_ref().trim().to_lowercase()))
            .collect();
        Self {
            mediums,
            replacements: VocabularyConfig::default().replacements,
        }
    }

    pub fn with_replacements(mut self, replacements: Vec<(String, String)>) -> Self {
        self.replacements = replacements;
        self
    }

    pub fn contains(&self, medium: &str) -> bool {
        self.mediums.contains(medium)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.mediums.iter().map(String::as_str)
    }

    pub fn replacements(&self) -> &[(String, String)] {
        &self.replacements
    }
}

/// Validates descriptor fields. Constructed once per run and passed by reference.
pub struct ContentValidator {
    /// `None` disables spelling advisories
    dictionary: Option<Dictionary>,
    mediums: MediumRegistry,
    terminal_punctuation: Vec<char>,
    hex_color: Regex,
    functional_color: Regex,
    email: Regex,
}

impl ContentValidator {
    pub fn new(dictionary: Option<Dictionary>, mediums: MediumRegistry, terminal_punctuation: Vec<char>) -> Self {
        Self {
            dictionary,
            mediums,
            terminal_punctuation,
            hex_color: Regex::new(r"^#([0-9a-f]{3,4}|[0-9a-f]{6}|[0-9a-f]{8})$").expect("hex color pattern"),
            functional_color: Regex::new(r"^(rgb|rgba|hsl|hsla)\(\s*[0-9.]+%?(\s*,\s*[0-9.]+%?){2,3}\s*\)$")
                .expect("functional color pattern"),
            email: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"),
        }
    }

    /// Build the validator described by the config, loading any extra word lists
    pub fn from_config(config: &PortfolioConfig) -> Result<Self> {
        let dictionary = if config.spelling.enabled {
            let mut dictionary = Dictionary::builtin();
            if config.spelling.system_dictionaries {
                for path in SYSTEM_WORD_LISTS.iter().map(Path::new).filter(|p| p.is_file()) {
                    dictionary.extend_from_file(path)?;
                    debug!(path = %path.display(), words = dictionary.len(), "Loaded system word list");
                }
            }
            for path in &config.spelling.dictionaries {
                dictionary.extend_from_file(path)?;
            }
            dictionary.extend(&config.spelling.extra_words);
            Some(dictionary)
        } else {
            None
        };

        Ok(Self::new(
            dictionary,
            MediumRegistry::with_extra(&config.vocabulary.mediums)
                .with_replacements(config.vocabulary.replacements.clone()),
            config.validation.terminal_punctuation.clone(),
        ))
    }

    pub fn mediums(&self) -> &MediumRegistry {
        &self.mediums
    }

    /// Sentence fields end with terminal punctuation and are spell checked.
    /// Trailing whitespace is ignored, so a block scalar ending in ".\n" passes.
    pub fn check_sentence(&self, field: &str, value: &str, report: &mut ValidationReport) {
        let ends_correctly = value
            .trim_end()
            .chars()
            .last()
            .map(|c| self.terminal_punctuation.contains(&c))
            .unwrap_or(false);

        if !ends_correctly {
            report.error(
                "SENTENCE_PUNCTUATION",
                field,
                format!(
                    "must end with one of {:?}: '{}'",
                    self.terminal_punctuation, value
                ),
            );
        }

        if let Some(dictionary) = &self.dictionary {
            let words = clean_and_split(value);
            for word in dictionary.unknown(&words) {
                report.advisories.push(SpellingAdvisory {
                    field: field.to_string(),
                    word: word.to_string(),
                    text: value.to_string(),
                });
            }
        }
    }

    pub fn check_url(&self, field: &str, value: &str, report: &mut ValidationReport) {
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
            Ok(url) => report.error(
                "INVALID_URL",
                field,
                format!("'{}' must be an http(s) URL with a host, got scheme '{}'", value, url.scheme()),
            ),
            Err(e) => report.error("INVALID_URL", field, format!("'{}': {}", value, e)),
        }
    }

    pub fn check_medium(&self, field: &str, value: &str, report: &mut ValidationReport) {
        if !self.mediums.contains(value) {
            report.error(
                "UNKNOWN_MEDIUM",
                field,
                format!("'{}' is not in the medium registry. Add it to vocabulary.mediums.", value),
            );
        }
    }

    pub fn check_color(&self, field: &str, value: &str, report: &mut ValidationReport) {
        let color = normalize_color(value);
        let valid = self.hex_color.is_match(&color)
            || self.functional_color.is_match(&color)
            || CSS_NAMED_COLORS.contains(&color.as_str());
        if !valid {
            report.error("INVALID_COLOR", field, format!("'{}' is not a CSS color", value));
        }
    }

    pub fn check_email(&self, field: &str, value: &str, report: &mut ValidationReport) {
        if !self.email.is_match(value) {
            report.error("INVALID_EMAIL", field, format!("'{}' is not an email address", value));
        }
    }
}

/// Canonical form of a CSS color string
pub fn normalize_color(value: &str) -> String {
    value.trim().to_lowercase()
}
