//! Patient note records and detected spans

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one patient note in the input stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    /// Patient number from the start sentinel
    pub patient_id: String,
    /// Note number from the start sentinel
    pub note_id: String,
}

impl RecordId {
    pub fn new(patient_id: impl Into<String>, note_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            note_id: note_id.into(),
        }
    }
}

/// Renders the report header line (without newline)
impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Patient {}\tNote {}", self.patient_id, self.note_id)
    }
}

/// One assembled patient note
///
/// `text` is the trimmed accumulator exactly as it appeared in the stream:
/// any lines since the previous record, the start sentinel line, the body and
/// the end sentinel line. Note-relative coordinates begin right after the
/// first start sentinel line, `header_len` characters into `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Patient and note numbers
    pub id: RecordId,
    /// Trimmed record text, sentinel lines included
    pub text: String,
    /// Characters of `text` through the first start sentinel line and its newline
    pub header_len: usize,
    /// 1-based input line number of the start sentinel
    pub first_line: usize,
}

impl Record {
    /// Length in characters of the note body (text after the header line)
    pub fn body_len(&self) -> usize {
        self.text.chars().count().saturating_sub(self.header_len)
    }

    /// The note body, without the start sentinel line
    pub fn body(&self) -> &str {
        match self.text.char_indices().nth(self.header_len) {
            Some((byte_idx, _)) => &self.text[byte_idx..],
            None => "",
        }
    }
}

/// A detected PHI span in note-relative character coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// The matched text
    pub text: String,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Span length in characters
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
