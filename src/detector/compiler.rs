//! Pattern compiler
//!
//! Builds one [`Pattern`] per PHI category. Lexicon terms are always escaped
//! before they are placed into an alternation, so no list entry can be read as
//! pattern syntax. Term order is preserved, which keeps the longest-first bias
//! of normalized lexicons under leftmost-first alternation.

use super::{patterns, OffsetCorrection, Pattern, PostFilter};
use crate::config::DetectorConfig;
use crate::domain::{PhiCategory, Result, ScanError};
use crate::lexicon::{self, Lexicon};

/// Backtracking budget per match attempt
pub const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;

/// Compiled-program size limit for lexicon alternations
pub const DEFAULT_SIZE_LIMIT: usize = 256 * (1 << 20);

/// Builds matchers for every PHI category
#[derive(Debug, Clone)]
pub struct PatternCompiler {
    backtrack_limit: usize,
}

impl Default for PatternCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self {
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
        }
    }

    /// Override the backtracking budget (`scan.backtrack_limit`)
    pub fn with_backtrack_limit(mut self, steps: usize) -> Self {
        self.backtrack_limit = steps;
        self
    }

    /// Load the detector's lexicons and build its pattern
    ///
    /// # Errors
    ///
    /// Fails when a lexicon file cannot be read or the pattern cannot be built.
    pub fn compile(&self, detector: &DetectorConfig) -> Result<Pattern> {
        let lexicons = lexicon::load_all(&detector.lexicons)?;
        let offset = detector.offset_correction();

        for empty in lexicons.iter().filter(|l| l.is_empty()) {
            tracing::warn!(
                category = %detector.category,
                path = %empty.source().display(),
                "Lexicon has no terms"
            );
        }

        let pattern = match detector.category {
            PhiCategory::Location => self.location(&lexicons, offset),
            PhiCategory::Name => self.provider_name(&lexicons, offset),
            PhiCategory::Phone => self.phone(offset),
            PhiCategory::Date => self.date(offset),
            PhiCategory::Age => self.age(offset, detector.age_threshold()),
        }?;

        tracing::info!(
            category = %detector.category,
            lexicons = lexicons.len(),
            terms = lexicons.iter().map(Lexicon::len).sum::<usize>(),
            offset = ?offset,
            "Compiled detector"
        );

        Ok(pattern)
    }

    /// Case-insensitive alternation of every location term
    pub fn location(&self, lexicons: &[Lexicon], offset: OffsetCorrection) -> Result<Pattern> {
        let alternation = patterns::literal_alternation(all_terms(lexicons)).ok_or_else(|| {
            ScanError::pattern(PhiCategory::Location, "lexicons contain no usable terms")
        })?;

        self.build(
            PhiCategory::Location,
            &format!("(?i)(?:{alternation})"),
            offset,
            None,
        )
    }

    /// Boundary-constrained name terms plus the `dr` / `dr.` fallback rule
    pub fn provider_name(&self, lexicons: &[Lexicon], offset: OffsetCorrection) -> Result<Pattern> {
        let alternation = patterns::literal_alternation(all_terms(lexicons));
        if alternation.is_none() {
            tracing::warn!("Name lexicons are empty, only the dr fallback rule will match");
        }

        self.build(
            PhiCategory::Name,
            &format!("(?i){}", patterns::provider_name(alternation.as_deref())),
            offset,
            None,
        )
    }

    pub fn phone(&self, offset: OffsetCorrection) -> Result<Pattern> {
        self.build(PhiCategory::Phone, patterns::PHONE, offset, None)
    }

    pub fn date(&self, offset: OffsetCorrection) -> Result<Pattern> {
        self.build(
            PhiCategory::Date,
            &format!("(?i){}", patterns::date()),
            offset,
            None,
        )
    }

    /// Ages strictly above `threshold`; only the digits are reported
    pub fn age(&self, offset: OffsetCorrection, threshold: u32) -> Result<Pattern> {
        self.build(
            PhiCategory::Age,
            &format!("(?i){}", patterns::age()),
            offset,
            Some(PostFilter::AboveValue(threshold)),
        )
    }

    fn build(
        &self,
        category: PhiCategory,
        source: &str,
        offset: OffsetCorrection,
        post_filter: Option<PostFilter>,
    ) -> Result<Pattern> {
        let regex = fancy_regex::RegexBuilder::new(source)
            .backtrack_limit(self.backtrack_limit)
            .delegate_size_limit(DEFAULT_SIZE_LIMIT)
            .build()
            .map_err(|e| ScanError::pattern(category, e))?;

        Ok(Pattern::new(category, regex, offset, post_filter))
    }
}

fn all_terms(lexicons: &[Lexicon]) -> impl Iterator<Item = &str> {
    lexicons
        .iter()
        .flat_map(|lexicon| lexicon.terms().iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MatchSpan, Record, RecordId};
    use test_case::test_case;

    fn record(body: &str) -> Record {
        let header = "start_of_record=1||||1||||\n";
        Record {
            id: RecordId::new("1", "1"),
            text: format!("{header}{body}\n||||END_OF_RECORD"),
            header_len: header.len(),
            first_line: 1,
        }
    }

    fn lexicon(terms: &[&str]) -> Lexicon {
        Lexicon::from_terms("test", terms.iter().map(|t| t.to_string()).collect())
    }

    fn matched(pattern: &Pattern, body: &str) -> Vec<String> {
        pattern
            .detect_all(&record(body))
            .unwrap()
            .into_iter()
            .map(|s| s.text)
            .collect()
    }

    #[test_case("Call 555-123-4567 today", "555-123-4567" ; "dashes")]
    #[test_case("Call 555.123.4567 today", "555.123.4567" ; "dots")]
    #[test_case("Call 555 123 4567 today", "555 123 4567" ; "spaces")]
    #[test_case("Call 555/123/4567 today", "555/123/4567" ; "slashes")]
    #[test_case("Call 5551234567 today", "5551234567" ; "bare digits")]
    #[test_case("Call (555) 123-4567 today", "(555) 123-4567" ; "area code parens")]
    fn test_phone_formats(body: &str, expected: &str) {
        let pattern = PatternCompiler::new().phone(OffsetCorrection::Structural).unwrap();
        assert_eq!(matched(&pattern, body), vec![expected]);
    }

    #[test]
    fn test_phone_span_length() {
        let pattern = PatternCompiler::new().phone(OffsetCorrection::Structural).unwrap();
        let spans = pattern
            .detect_all(&record("Patient called 555-123-4567 on 3/4/2020."))
            .unwrap();
        assert_eq!(spans, vec![MatchSpan::new(15, 27, "555-123-4567")]);
    }

    #[test_case("seen 3/4/2020 in clinic", "3/4/2020" ; "m d yyyy")]
    #[test_case("seen 12/31/1999 in clinic", "12/31/1999" ; "mm dd yyyy")]
    #[test_case("seen 03-04-2021 in clinic", "03-04-2021" ; "hyphenated")]
    #[test_case("born in 1948 here", "1948" ; "bare year")]
    #[test_case("admitted in March", "March" ; "month name")]
    #[test_case("admitted in SEPT", "SEPT" ; "upper abbreviation")]
    fn test_date_forms(body: &str, expected: &str) {
        let pattern = PatternCompiler::new().date(OffsetCorrection::Structural).unwrap();
        assert_eq!(matched(&pattern, body), vec![expected]);
    }

    #[test]
    fn test_date_rejects_out_of_range_years() {
        let pattern = PatternCompiler::new().date(OffsetCorrection::Structural).unwrap();
        assert!(matched(&pattern, "dose 1850 units, lot 2099").is_empty());
        // Mismatched separators fall back to the bare year
        assert_eq!(matched(&pattern, "mixed 03-04/2021 separators"), vec!["2021"]);
    }

    #[test]
    fn test_date_month_requires_word_boundary() {
        let pattern = PatternCompiler::new().date(OffsetCorrection::Structural).unwrap();
        assert!(matched(&pattern, "Mark was dismayed").is_empty());
    }

    #[test_case("91 years old", Some("91") ; "years old")]
    #[test_case("a 102 yo man", Some("102") ; "yo")]
    #[test_case("a 95 y.o. woman", Some("95") ; "dotted")]
    #[test_case("93 yrs old", Some("93") ; "yrs")]
    #[test_case("90 YEAR OLD", Some("90") ; "upper case")]
    #[test_case("85 yo", None ; "below threshold")]
    #[test_case("89 years old", None ; "at threshold")]
    #[test_case("took 95 mg", None ; "no cue")]
    #[test_case("a \u{669}\u{661} years old man", None ; "non ascii digits")]
    #[test_case("a 9\u{661} years old man", None ; "mixed digits")]
    fn test_age(body: &str, expected: Option<&str>) {
        let pattern = PatternCompiler::new()
            .age(OffsetCorrection::Structural, 89)
            .unwrap();
        let found = matched(&pattern, body);
        assert_eq!(found, expected.into_iter().map(String::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_location_is_case_insensitive_and_escaped() {
        let pattern = PatternCompiler::new()
            .location(
                &[lexicon(&["St. Mary's", "Boston"]), lexicon(&["", "Georgia"])],
                OffsetCorrection::Structural,
            )
            .unwrap();
        assert_eq!(
            matched(&pattern, "From BOSTON to st. mary's, then Stx Mary's in georgia"),
            vec!["BOSTON", "st. mary's", "georgia"]
        );
    }

    #[test]
    fn test_location_prefers_earlier_longer_term() {
        let pattern = PatternCompiler::new()
            .location(&[lexicon(&["new york city", "new york"])], OffsetCorrection::Structural)
            .unwrap();
        assert_eq!(matched(&pattern, "moved to New York City"), vec!["New York City"]);
    }

    #[test]
    fn test_location_without_terms_fails() {
        let result = PatternCompiler::new().location(&[lexicon(&["", ""])], OffsetCorrection::Structural);
        assert!(matches!(
            result,
            Err(ScanError::Pattern {
                category: PhiCategory::Location,
                ..
            })
        ));
    }

    #[test]
    fn test_name_requires_boundaries() {
        let pattern = PatternCompiler::new()
            .provider_name(&[lexicon(&["an", "smith"])], OffsetCorrection::Structural)
            .unwrap();
        assert!(matched(&pattern, "Seen by Anderson today").is_empty());
        assert_eq!(
            matched(&pattern, "Seen by Smith, then An."),
            vec!["Smith", "An"]
        );
    }

    #[test_case("Seen by Dr Zhvania and dr. Okonkwo today", &["Zhvania", "Okonkwo"] ; "space after cue")]
    #[test_case("Seen by Dr\tZhvania today", &["Zhvania"] ; "tab after cue")]
    #[test_case("Seen by Dr\nZhvania today", &["Zhvania"] ; "line wrapped after cue")]
    #[test_case("Seen by Dr.\nOkonkwo, then discharged", &["Okonkwo"] ; "line wrapped after dotted cue")]
    #[test_case("Seen by Drake today", &[] ; "cue inside a word")]
    fn test_name_dr_fallback(body: &str, expected: &[&str]) {
        let pattern = PatternCompiler::new()
            .provider_name(&[], OffsetCorrection::Structural)
            .unwrap();
        assert_eq!(matched(&pattern, body), expected);
    }

    #[test]
    fn test_backtrack_limit_from_settings() {
        let settings = crate::config::ScanSettings::default();
        assert_eq!(settings.backtrack_limit, DEFAULT_BACKTRACK_LIMIT);

        let compiler = PatternCompiler::new().with_backtrack_limit(5_000);
        assert_eq!(compiler.backtrack_limit, 5_000);
        assert!(compiler.provider_name(&[], OffsetCorrection::Structural).is_ok());
    }

    #[test]
    fn test_compile_from_config_reads_lexicons() {
        use crate::lexicon::{LexiconMode, LexiconSource};
        use std::io::Write;

        let mut list = tempfile::NamedTempFile::new().unwrap();
        writeln!(list, "Decatur\nMacon").unwrap();

        let mut detector = DetectorConfig::new(PhiCategory::Location);
        detector.lexicons = vec![LexiconSource::new(list.path(), LexiconMode::RawLines)];

        let pattern = PatternCompiler::new().compile(&detector).unwrap();
        assert_eq!(pattern.category(), PhiCategory::Location);
        assert_eq!(matched(&pattern, "Lives in Macon"), vec!["Macon"]);
    }

    #[test]
    fn test_compile_missing_lexicon_is_fatal() {
        use crate::lexicon::{LexiconMode, LexiconSource};

        let mut detector = DetectorConfig::new(PhiCategory::Name);
        detector.lexicons = vec![LexiconSource::new(
            "/nonexistent/doctor_last_names.txt",
            LexiconMode::Normalized,
        )];
        assert!(matches!(
            PatternCompiler::new().compile(&detector),
            Err(ScanError::Io { .. })
        ));
    }
}
