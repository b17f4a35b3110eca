//! PHI span detection
//!
//! A [`Pattern`] is one compiled matcher per PHI category together with the
//! metadata needed to turn raw match positions into note-relative spans: the
//! [`OffsetCorrection`] and an optional [`PostFilter`]. Patterns are built once
//! per run by the [`PatternCompiler`] and shared by reference across records.
//!
//! Detection is lazy: [`Pattern::detect`] returns a [`Spans`] iterator that
//! scans the record left to right with leftmost-first, non-overlapping
//! semantics and yields spans in ascending `start` order.

pub mod compiler;
pub mod patterns;

pub use compiler::PatternCompiler;

use crate::domain::{MatchSpan, PhiCategory, Record, Result, ScanError};
use serde::{Deserialize, Serialize};

/// Offset correction used by the original location, name, phone and date detectors
pub const LEGACY_OFFSET: usize = 27;

/// Offset correction used by the original age detector
pub const LEGACY_AGE_OFFSET: usize = 29;

/// Fixed offset the original detector family used for `category`
pub fn legacy_offset(category: PhiCategory) -> usize {
    match category {
        PhiCategory::Age => LEGACY_AGE_OFFSET,
        _ => LEGACY_OFFSET,
    }
}

/// Default age threshold; only ages strictly above it are reported
pub const DEFAULT_AGE_THRESHOLD: u32 = 89;

/// How raw positions in the record text map to note-relative positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OffsetCorrection {
    /// Subtract the length of the record's start sentinel line
    #[default]
    Structural,
    /// Subtract a fixed number of characters
    Fixed(usize),
}

impl OffsetCorrection {
    /// Characters to subtract for the given record
    pub fn resolve(&self, record: &Record) -> usize {
        match self {
            Self::Structural => record.header_len,
            Self::Fixed(n) => *n,
        }
    }
}

impl From<Option<usize>> for OffsetCorrection {
    fn from(value: Option<usize>) -> Self {
        value.map(Self::Fixed).unwrap_or(Self::Structural)
    }
}

/// Per-category acceptance test applied to each raw match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    /// Keep only numeric matches strictly greater than the value
    AboveValue(u32),
}

impl PostFilter {
    pub fn accepts(&self, matched: &str) -> bool {
        match self {
            Self::AboveValue(threshold) => matched
                .trim()
                .parse::<u32>()
                .map(|value| value > *threshold)
                .unwrap_or(false),
        }
    }
}

/// Compiled matcher for one PHI category
#[derive(Debug)]
pub struct Pattern {
    category: PhiCategory,
    regex: fancy_regex::Regex,
    offset: OffsetCorrection,
    post_filter: Option<PostFilter>,
}

impl Pattern {
    /// Wrap an already-compiled matcher
    pub fn new(
        category: PhiCategory,
        regex: fancy_regex::Regex,
        offset: OffsetCorrection,
        post_filter: Option<PostFilter>,
    ) -> Self {
        Self {
            category,
            regex,
            offset,
            post_filter,
        }
    }

    pub fn category(&self) -> PhiCategory {
        self.category
    }

    pub fn offset(&self) -> OffsetCorrection {
        self.offset
    }

    /// Pattern-language source of the matcher
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Lazily scan one record
    ///
    /// Each call starts a fresh scan from the beginning of the record.
    pub fn detect<'p, 'r>(&'p self, record: &'r Record) -> Spans<'p, 'r> {
        Spans {
            pattern: self,
            record,
            matches: self.regex.find_iter(&record.text),
            correction: self.offset.resolve(record),
            byte_cursor: 0,
            char_cursor: 0,
            dropped: 0,
        }
    }

    /// Collect every span of one record
    pub fn detect_all(&self, record: &Record) -> Result<Vec<MatchSpan>> {
        self.detect(record).collect()
    }
}

/// Lazy sequence of spans for one record
///
/// Raw byte offsets are converted to character offsets incrementally; matches
/// arrive in ascending order so the text is walked once.
pub struct Spans<'p, 'r> {
    pattern: &'p Pattern,
    record: &'r Record,
    matches: fancy_regex::Matches<'p, 'r>,
    correction: usize,
    byte_cursor: usize,
    char_cursor: usize,
    dropped: usize,
}

impl Spans<'_, '_> {
    /// Matches discarded because they fell inside the sentinel framing
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn char_offset(&mut self, byte: usize) -> usize {
        self.char_cursor += self.record.text[self.byte_cursor..byte].chars().count();
        self.byte_cursor = byte;
        self.char_cursor
    }
}

impl Iterator for Spans<'_, '_> {
    type Item = Result<MatchSpan>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let found = match self.matches.next()? {
                Ok(m) => m,
                Err(e) => return Some(Err(ScanError::pattern(self.pattern.category, e))),
            };

            if let Some(filter) = self.pattern.post_filter {
                if !filter.accepts(found.as_str()) {
                    continue;
                }
            }

            let start = self.char_offset(found.start());
            let end = start + found.as_str().chars().count();

            if start < self.correction {
                self.dropped += 1;
                tracing::debug!(
                    category = %self.pattern.category,
                    record = %self.record.id,
                    raw_start = start,
                    "Dropping match inside record framing"
                );
                continue;
            }

            return Some(Ok(MatchSpan::new(
                start - self.correction,
                end - self.correction,
                found.as_str(),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;

    fn record(body: &str) -> Record {
        let header = "start_of_record=1||||1||||\n";
        Record {
            id: RecordId::new("1", "1"),
            text: format!("{header}{body}"),
            header_len: header.chars().count(),
            first_line: 1,
        }
    }

    fn digits() -> Pattern {
        Pattern::new(
            PhiCategory::Phone,
            fancy_regex::Regex::new(r"\d+").unwrap(),
            OffsetCorrection::Structural,
            None,
        )
    }

    #[test]
    fn test_spans_are_note_relative() {
        let rec = record("call 555 now");
        let spans = digits().detect_all(&rec).unwrap();
        assert_eq!(spans, vec![MatchSpan::new(5, 8, "555")]);
    }

    #[test]
    fn test_header_digits_are_dropped() {
        // The sentinel's own digits match \d+ but sit inside the framing
        let rec = record("x 42");
        let pattern = digits();
        let mut spans = pattern.detect(&rec);
        let collected: Vec<_> = spans.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(collected, vec![MatchSpan::new(2, 4, "42")]);
        assert_eq!(spans.dropped(), 2);
    }

    #[test]
    fn test_offsets_count_characters() {
        let rec = record("Zoë é 12");
        let spans = digits().detect_all(&rec).unwrap();
        assert_eq!(spans[0].start, 6);
        assert_eq!(spans[0].end, 8);
    }

    #[test]
    fn test_fixed_offset() {
        let rec = record("call 555");
        let pattern = Pattern::new(
            PhiCategory::Phone,
            fancy_regex::Regex::new(r"555").unwrap(),
            OffsetCorrection::Fixed(LEGACY_AGE_OFFSET),
            None,
        );
        let spans = pattern.detect_all(&rec).unwrap();
        assert_eq!(spans, vec![MatchSpan::new(3, 6, "555")]);
    }

    #[test]
    fn test_detect_restarts_each_call() {
        let rec = record("1 2 3");
        let pattern = digits();
        assert_eq!(pattern.detect(&rec).count(), 3);
        assert_eq!(pattern.detect(&rec).count(), 3);
    }

    #[test]
    fn test_post_filter() {
        let filter = PostFilter::AboveValue(DEFAULT_AGE_THRESHOLD);
        assert!(!filter.accepts("85"));
        assert!(!filter.accepts("89"));
        assert!(filter.accepts("90"));
        assert!(filter.accepts("104"));
        assert!(!filter.accepts("abc"));
    }

    #[test]
    fn test_legacy_offsets() {
        assert_eq!(legacy_offset(PhiCategory::Location), LEGACY_OFFSET);
        assert_eq!(legacy_offset(PhiCategory::Phone), 27);
        assert_eq!(legacy_offset(PhiCategory::Age), 29);
    }

    #[test]
    fn test_offset_from_option() {
        assert_eq!(OffsetCorrection::from(None), OffsetCorrection::Structural);
        assert_eq!(OffsetCorrection::from(Some(27)), OffsetCorrection::Fixed(27));
    }
}
