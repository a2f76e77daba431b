//! Filename classification: derive an episode [`Stem`] from a video filename.
//!
//! Classification runs an ordered list of strategies and stops at the first one
//! that recognizes the name. When none does, the caller gets a fallback stem
//! built from the whole filename.

use std::sync::LazyLock;

use archivist_core::Stem;
use regex::Regex;

/// A single classification strategy: a pure function from filename to stem.
pub type Strategy = fn(&str) -> Option<Stem>;

/// Strategies in priority order, paired with the name reported in logs.
pub static STRATEGIES: &[(&str, Strategy)] = &[
    ("season_episode", season_episode),
    ("series_number", series_number),
];

/// Result of classifying a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Classified {
        stem: Stem,
        strategy: &'static str,
    },
    Unclassified {
        fallback: Stem,
    },
}

impl Classification {
    pub fn stem(&self) -> &Stem {
        match self {
            Self::Classified { stem, .. } => stem,
            Self::Unclassified { fallback } => fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Unclassified { .. })
    }
}

static NAMES_TO_IGNORE: &[&str] = &["@eaDir", "#recycle", "Thumbs.db"];

static VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "mov", "avi", "m4v", "mpg", "mpeg", "wmv", "webm", "flv",
];

// s01e02, S01E02: exactly two digits each
static RE_SEASON_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s([0-9]{2})e([0-9]{2})").unwrap());

// "My Series 7 - Title", "Show_Name_012"
static RE_SERIES_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<series>.*?\p{L}.*?)[\s_]+(?P<number>[0-9]{1,4})(?:[\s_.\-]|$)").unwrap()
});

/// Check if a directory entry should be left out of the walk.
pub fn should_ignore(name: &str) -> bool {
    name.starts_with('.') || NAMES_TO_IGNORE.contains(&name)
}

/// Check if a file has a video extension.
pub fn is_video_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => {
            VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}

/// Lowercase, drop punctuation, and join words with single underscores.
///
/// Whitespace, hyphens and underscores separate words; every other
/// non-alphanumeric character is removed.
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase().filter(|l| l.is_alphanumeric()));
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_sep = true;
        }
    }
    out
}

fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => &filename[..pos],
        _ => filename,
    }
}

/// Season/episode marker anywhere in the name: `Show.S02E05.mkv` → `s02e05`.
pub fn season_episode(filename: &str) -> Option<Stem> {
    let caps = RE_SEASON_EPISODE.captures(filename)?;
    Stem::new(format!("s{}e{}", &caps[1], &caps[2]))
}

/// Leading series name plus episode number: `My Series 7 - Title.mp4` → `my_series_e007`.
///
/// Numbers below 1000 are padded to three digits; larger ones are kept as is.
pub fn series_number(filename: &str) -> Option<Stem> {
    let caps = RE_SERIES_NUMBER.captures(strip_extension(filename))?;
    let series = slugify(&caps["series"]);
    let number: u32 = caps["number"].parse().ok()?;
    if series.is_empty() {
        return None;
    }
    Stem::new(format!("{series}_e{number:03}"))
}

/// Generic stem for names no strategy recognizes.
///
/// Long names are cut to [`Stem::MAX_LEN`] bytes on a character boundary.
pub fn fallback_stem(filename: &str) -> Stem {
    let mut slug = slugify(strip_extension(filename));
    if slug.len() > Stem::MAX_LEN {
        let mut cut = Stem::MAX_LEN;
        while !slug.is_char_boundary(cut) {
            cut -= 1;
        }
        slug.truncate(cut);
        slug.truncate(slug.trim_end_matches('_').len());
    }
    Stem::new(slug).unwrap_or_else(Stem::untitled)
}

/// Classify a bare filename (no directory components).
pub fn classify(filename: &str) -> Classification {
    for (name, strategy) in STRATEGIES {
        if let Some(stem) = strategy(filename) {
            return Classification::Classified {
                stem,
                strategy: *name,
            };
        }
    }
    Classification::Unclassified {
        fallback: fallback_stem(filename),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
