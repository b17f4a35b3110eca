//! Lexicon loading
//!
//! Auxiliary word, name and place lists are read from disk, decoded with a
//! detected charset and normalized according to a [`LexiconMode`]. The result
//! is an ordered, immutable [`Lexicon`] used only to build a matcher.

pub mod encoding;

use crate::domain::{Result, ScanError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Filler words removed in [`LexiconMode::Filter`]
pub const STOP_WORDS: [&str; 9] = ["of", "the", "and", "in", "to", "for", "a", "an", "is"];

/// Minimum term length kept in [`LexiconMode::Normalized`]
pub const MIN_TERM_LEN: usize = 2;

/// How a lexicon file is turned into terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LexiconMode {
    /// Alphabetic tokens minus stop words, original case and order
    Filter,
    /// Every physical line verbatim (multi-word phrases)
    #[default]
    RawLines,
    /// Alphabetic-only lines, case-folded, de-duplicated, longest first
    Normalized,
}

/// A lexicon file and the mode it is loaded with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconSource {
    /// Path to the list file
    pub path: PathBuf,

    /// Normalization mode
    #[serde(default)]
    pub mode: LexiconMode,
}

impl LexiconSource {
    pub fn new(path: impl Into<PathBuf>, mode: LexiconMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }
}

/// Ordered sequence of terms loaded from one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    source: PathBuf,
    terms: Vec<String>,
}

impl Lexicon {
    /// Build a lexicon from already-normalized terms
    pub fn from_terms(source: impl Into<PathBuf>, terms: Vec<String>) -> Self {
        Self {
            source: source.into(),
            terms,
        }
    }

    /// Path the lexicon was read from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Load a lexicon file
///
/// # Errors
///
/// Returns [`ScanError::Io`] when the file cannot be read. Lines that cannot be
/// decoded are skipped with a warning rather than failing the load.
pub fn load(path: impl AsRef<Path>, mode: LexiconMode) -> Result<Lexicon> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ScanError::io(path, e))?;
    let decoded = encoding::decode_lines(path, &bytes);

    let terms = match mode {
        LexiconMode::Filter => filter_tokens(&decoded.joined()),
        LexiconMode::RawLines => decoded.lines,
        LexiconMode::Normalized => normalize_lines(decoded.lines.iter().map(String::as_str)),
    };

    tracing::debug!(
        path = %path.display(),
        ?mode,
        terms = terms.len(),
        "Loaded lexicon"
    );

    Ok(Lexicon::from_terms(path, terms))
}

/// Load every source in order
pub fn load_all(sources: &[LexiconSource]) -> Result<Vec<Lexicon>> {
    sources.iter().map(|s| load(&s.path, s.mode)).collect()
}

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\b[a-zA-Z]+\b").expect("static word pattern is valid"))
}

/// Alphabetic tokens with stop words removed, original case and order
pub fn filter_tokens(text: &str) -> Vec<String> {
    word_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|word| !STOP_WORDS.contains(&word.to_lowercase().as_str()))
        .map(str::to_string)
        .collect()
}

/// Normalize name-list lines
///
/// Keeps purely alphabetic lines, case-folds them, strips `|` delimiters,
/// drops terms shorter than [`MIN_TERM_LEN`], removes duplicates (first one
/// wins) and sorts longest-first. The sort is stable so equal-length terms
/// keep file order.
pub fn normalize_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut terms: Vec<String> = lines
        .into_iter()
        .filter(|line| !line.is_empty() && line.chars().all(char::is_alphabetic))
        .map(|line| line.to_lowercase().replace('|', ""))
        .filter(|term| term.chars().count() >= MIN_TERM_LEN)
        .filter(|term| seen.insert(term.clone()))
        .collect();

    terms.sort_by_key(|term| std::cmp::Reverse(term.chars().count()));
    terms
}
