//! Structural pattern sources for numeric PHI formats
//!
//! These are pattern-language sources, not compiled matchers; the compiler
//! combines them with the category's flags. Lexicon-driven sources are built
//! at run time in [`super::compiler`].

/// Years 1900 through 2022
pub const YEAR: &str = r"(?:19[0-9]{2}|200[0-9]|201[0-9]|202[0-2])";

/// `555-123-4567`, `555.123.4567`, `555 123 4567`, `5551234567`, `(555) 123-4567`
pub const PHONE: &str =
    r"\d{3}[-.\s/]??\d{3}[-.\s/]??\d{4}|\(\d{3}\)\s*\d{3}[-.\s/]??\d{4}";

/// Separators that may stand in for whitespace around a name
const NAME_EDGE: &str = r"[ \t\r\n\f.,]";

/// Cue words that introduce an age, matched after optional whitespace
pub const AGE_CUES: &str = r"yo|y\.?o\.?|yrs\.?\s*old|year\s*old|years\s*old";

/// Full and abbreviated month names
pub const MONTHS: [&str; 24] = [
    "January", "Jan", "February", "Feb", "March", "Mar", "April", "Apr", "May", "June", "Jun",
    "July", "Jul", "August", "Aug", "September", "Sept", "Sep", "October", "Oct", "November",
    "Nov", "December", "Dec",
];

/// Numeric dates, bare years and month names
pub fn date() -> String {
    let months = MONTHS.join("|");
    [
        // M/D/YYYY
        format!(r"\d{{1,2}}/\d{{1,2}}/{YEAR}"),
        // D-M-YYYY or D/M/YYYY with matching separators
        format!(r"\b(?:3[01]|[12][0-9]|0?[1-9])(?P<sep>[/-])(?:1[0-2]|0?[1-9])\k<sep>{YEAR}\b"),
        format!(r"\b{YEAR}\b"),
        format!(r"\b(?:{months})\b"),
    ]
    .join("|")
}

/// 1-3 ASCII digit number followed by an age cue; the cue is not part of the match
pub fn age() -> String {
    format!(r"\b[0-9]{{1,3}}(?=\s*(?:{AGE_CUES})\b)")
}

/// Escaped literal alternation, empty terms removed
pub fn literal_alternation<'a>(terms: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let escaped: Vec<String> = terms
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(|t| fancy_regex::escape(t).into_owned())
        .collect();

    if escaped.is_empty() {
        None
    } else {
        Some(escaped.join("|"))
    }
}

/// Provider name source: bounded lexicon terms plus the `dr` fallback
pub fn provider_name(terms: Option<&str>) -> String {
    let generic = [
        format!(r"(?<=dr\s)[a-z]+(?={NAME_EDGE})"),
        format!(r"(?<=dr\.\s)[a-z]+(?={NAME_EDGE})"),
    ];

    match terms {
        Some(alt) => format!(
            r"(?<={NAME_EDGE})(?:{alt})(?={NAME_EDGE})|{}",
            generic.join("|")
        ),
        None => generic.join("|"),
    }
}
