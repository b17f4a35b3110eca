//! Charset detection for lexicon files
//!
//! Lexicon lists come from many sources and are not guaranteed to be UTF-8.
//! The byte-order mark wins when present; otherwise `chardetng` guesses from
//! the full file content.

use crate::domain::ScanError;
use encoding_rs::Encoding;
use std::borrow::Cow;
use std::path::Path;

/// Text decoded from a lexicon file
#[derive(Debug)]
pub struct DecodedText {
    /// Decoded lines, undecodable ones removed
    pub lines: Vec<String>,
    /// Name of the encoding used
    pub encoding: &'static str,
    /// 1-based line numbers that were skipped
    pub skipped: Vec<usize>,
}

impl DecodedText {
    /// The remaining lines joined back together with `\n`
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

/// Guess the encoding of raw file content
pub fn detect_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, bom_len);
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    (detector.guess(None, true), 0)
}

/// Decode lexicon bytes line by line
///
/// Lines containing malformed sequences are skipped; each skip is logged as a
/// warning carrying a [`ScanError::Encoding`] so loading continues.
pub fn decode_lines(path: &Path, bytes: &[u8]) -> DecodedText {
    let (encoding, bom_len) = detect_encoding(bytes);
    let (text, had_errors): (Cow<'_, str>, bool) =
        encoding.decode_without_bom_handling(&bytes[bom_len..]);

    let mut lines = Vec::new();
    let mut skipped = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if had_errors && line.contains(char::REPLACEMENT_CHARACTER) {
            let err = ScanError::Encoding {
                path: path.to_path_buf(),
                line: idx + 1,
                encoding: encoding.name().to_string(),
            };
            tracing::warn!(error = %err, "Skipping undecodable lexicon line");
            skipped.push(idx + 1);
            continue;
        }
        lines.push(line.to_string());
    }

    DecodedText {
        lines,
        encoding: encoding.name(),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_utf8() {
        let decoded = decode_lines(Path::new("t.txt"), "Zürich\nBoston\n".as_bytes());
        assert_eq!(decoded.encoding, "UTF-8");
        assert_eq!(decoded.lines, vec!["Zürich", "Boston"]);
        assert!(decoded.skipped.is_empty());
    }

    #[test]
    fn test_detects_latin1_family() {
        // "Montréal" and "Québec" in windows-1252
        let bytes = b"Montr\xe9al\nQu\xe9bec\nLaval\n";
        let decoded = decode_lines(Path::new("t.txt"), bytes);
        assert_ne!(decoded.encoding, "UTF-8");
        assert_eq!(decoded.lines.len(), 3);
        assert_eq!(decoded.lines[2], "Laval");
        assert!(decoded.skipped.is_empty());
    }

    #[test]
    fn test_bom_is_honoured_and_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Atlanta\n");
        let decoded = decode_lines(Path::new("t.txt"), &bytes);
        assert_eq!(decoded.encoding, "UTF-8");
        assert_eq!(decoded.lines, vec!["Atlanta"]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        // Valid UTF-8 BOM forces UTF-8, second line is not valid UTF-8
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Decatur\nbad\xff\xfeline\nMacon\n");
        let decoded = decode_lines(Path::new("t.txt"), &bytes);
        assert_eq!(decoded.lines, vec!["Decatur", "Macon"]);
        assert_eq!(decoded.skipped, vec![2]);
    }
}
