//! Record segmentation
//!
//! Splits a line-oriented input stream into [`Record`]s delimited by
//! `start_of_record=<patientId>||||<noteId>||||` and `...||||END_OF_RECORD`
//! sentinel lines. The segmenter is a plain iterator so a single read of the
//! input can feed any number of category passes.
//!
//! Every line is accumulated; only an end sentinel emits and resets. Lines
//! between records therefore open the next record's text, and a start
//! sentinel inside an open record only replaces its id. Note coordinates
//! begin after the first start sentinel of the accumulator, or at its start
//! for a lenient record closed without one.

use crate::config::SegmenterConfig;
use crate::domain::{Record, RecordId, Result, ScanError};
use encoding_rs::{Encoding, WINDOWS_1252};
use regex::Regex;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn start_sentinel() -> &'static Regex {
    static START: OnceLock<Regex> = OnceLock::new();
    START.get_or_init(|| {
        Regex::new(r"(?i)^start_of_record=(\d+)\|\|\|\|(\d+)\|\|\|\|$")
            .expect("static start sentinel pattern is valid")
    })
}

fn end_sentinel() -> &'static Regex {
    static END: OnceLock<Regex> = OnceLock::new();
    END.get_or_init(|| {
        Regex::new(r"(?i)\|\|\|\|END_OF_RECORD$").expect("static end sentinel pattern is valid")
    })
}

/// How raw input bytes become text
#[derive(Debug, Clone, Copy)]
pub enum LineDecoder {
    /// UTF-8, falling back to Windows-1252 for lines that are not valid UTF-8
    Utf8WithFallback,
    /// A single explicitly configured encoding
    Fixed(&'static Encoding),
}

impl LineDecoder {
    /// Decoder for an optional WHATWG encoding label
    pub fn from_label(label: Option<&str>) -> Result<Self> {
        match label {
            None => Ok(Self::Utf8WithFallback),
            Some(label) => Encoding::for_label(label.as_bytes())
                .map(Self::Fixed)
                .ok_or_else(|| {
                    ScanError::Configuration(format!("Unknown input encoding '{label}'"))
                }),
        }
    }

    fn decode<'a>(&self, bytes: &'a [u8], source: &Path, line: usize) -> Cow<'a, str> {
        match self {
            Self::Utf8WithFallback => match std::str::from_utf8(bytes) {
                Ok(text) => Cow::Borrowed(text),
                Err(_) => {
                    tracing::warn!(
                        path = %source.display(),
                        line,
                        "Input line is not valid UTF-8, decoding as windows-1252"
                    );
                    WINDOWS_1252.decode_without_bom_handling(bytes).0
                }
            },
            Self::Fixed(encoding) => {
                let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
                if had_errors {
                    tracing::warn!(
                        path = %source.display(),
                        line,
                        encoding = encoding.name(),
                        "Input line contains undecodable bytes"
                    );
                }
                text
            }
        }
    }
}

/// Counters kept while segmenting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmenterStats {
    pub lines: usize,
    pub records: usize,
    /// Lines after the last end sentinel that no later sentinel claimed
    pub discarded_lines: usize,
    /// Records opened but never closed by an end sentinel
    pub abandoned_records: usize,
}

struct OpenRecord {
    id: RecordId,
    /// Untrimmed accumulator
    text: String,
    /// Characters of `text` up to and including the first start sentinel line
    header_end: usize,
    first_line: usize,
}

impl OpenRecord {
    fn close(self) -> Record {
        let leading = self.text.len() - self.text.trim_start().len();
        let trimmed_chars = self.text[..leading].chars().count();
        Record {
            id: self.id,
            text: self.text.trim().to_string(),
            header_len: self.header_end.saturating_sub(trimmed_chars),
            first_line: self.first_line,
        }
    }
}

/// Iterator over the records of one input stream
///
/// Yields `Err` at most once; iteration ends after an error.
pub struct RecordSegmenter<R> {
    reader: R,
    source: PathBuf,
    decoder: LineDecoder,
    strict: bool,
    buf: Vec<u8>,
    open: Option<OpenRecord>,
    stray: String,
    stray_start: usize,
    last_id: Option<RecordId>,
    stats: SegmenterStats,
    done: bool,
}

impl RecordSegmenter<BufReader<File>> {
    /// Open an input file with the given settings
    pub fn open(path: impl AsRef<Path>, config: &SegmenterConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ScanError::io(path, e))?;
        let decoder = LineDecoder::from_label(config.input_encoding.as_deref())?;

        Ok(Self::new(BufReader::new(file), path)
            .with_decoder(decoder)
            .strict(config.strict))
    }
}

impl<R: BufRead> RecordSegmenter<R> {
    /// Strict segmenter over any buffered reader; `source` names it in errors
    pub fn new(reader: R, source: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            source: source.into(),
            decoder: LineDecoder::Utf8WithFallback,
            strict: true,
            buf: Vec::new(),
            open: None,
            stray: String::new(),
            stray_start: 0,
            last_id: None,
            stats: SegmenterStats::default(),
            done: false,
        }
    }

    pub fn with_decoder(mut self, decoder: LineDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// In non-strict mode an end sentinel without a start reuses the last id
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn stats(&self) -> SegmenterStats {
        self.stats
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|e| ScanError::io(&self.source, e))?;
        if read == 0 {
            return Ok(None);
        }

        self.stats.lines += 1;
        let line_no = self.stats.lines;
        let decoded = self.decoder.decode(&self.buf, &self.source, line_no);

        let mut text = if line_no == 1 {
            decoded.strip_prefix('\u{feff}').unwrap_or(&*decoded).to_string()
        } else {
            decoded.into_owned()
        };

        if text.contains('\r') {
            text = text.replace("\r\n", "\n").replace('\r', "\n");
        }

        Ok(Some(text))
    }

    fn step(&mut self, line: String) -> Result<Option<Record>> {
        let line_no = self.stats.lines;
        let content = line.strip_suffix('\n').unwrap_or(&line);

        if let Some(caps) = start_sentinel().captures(content) {
            let id = RecordId::new(&caps[1], &caps[2]);
            self.last_id = Some(id.clone());

            // A second start inside a record renames it; its text and framing stay
            if let Some(open) = &mut self.open {
                tracing::warn!(
                    record = %open.id,
                    renamed_to = %id,
                    first_line = open.first_line,
                    line = line_no,
                    "Start sentinel inside an open record"
                );
                open.id = id;
                open.text.push_str(&line);
                return Ok(None);
            }

            let mut text = std::mem::take(&mut self.stray);
            let header_end = text.chars().count() + content.chars().count() + 1;
            text.push_str(&line);
            self.open = Some(OpenRecord {
                id,
                text,
                header_end,
                first_line: line_no,
            });
            return Ok(None);
        }

        if end_sentinel().is_match(content) {
            let record = match self.open.take() {
                Some(mut open) => {
                    open.text.push_str(&line);
                    open
                }
                None => self.orphan_end(line, line_no)?,
            };
            self.stats.records += 1;
            return Ok(Some(record.close()));
        }

        match &mut self.open {
            Some(open) => open.text.push_str(&line),
            None => {
                if self.stray.is_empty() {
                    self.stray_start = line_no;
                }
                self.stray.push_str(&line);
            }
        }

        Ok(None)
    }

    fn orphan_end(&mut self, line: String, line_no: usize) -> Result<OpenRecord> {
        let id = match (&self.last_id, self.strict) {
            (Some(id), false) => id.clone(),
            (Some(_), true) => {
                return Err(ScanError::MalformedInput {
                    line: line_no,
                    message: "end sentinel without a start sentinel since the last record"
                        .to_string(),
                })
            }
            (None, _) => {
                return Err(ScanError::MalformedInput {
                    line: line_no,
                    message: "end sentinel before any start sentinel".to_string(),
                })
            }
        };

        tracing::warn!(record = %id, line = line_no, "End sentinel without start, reusing last record id");

        let mut text = std::mem::take(&mut self.stray);
        let first_line = if text.is_empty() { line_no } else { self.stray_start };
        text.push_str(&line);

        Ok(OpenRecord {
            id,
            text,
            header_end: 0,
            first_line,
        })
    }

    fn discard_stray(&mut self) {
        if !self.stray.is_empty() {
            self.stats.discarded_lines += self.stray.lines().count();
            self.stray.clear();
        }
    }

    fn finish(&mut self) {
        self.done = true;
        self.discard_stray();

        if let Some(open) = self.open.take() {
            self.stats.abandoned_records += 1;
            tracing::warn!(
                record = %open.id,
                first_line = open.first_line,
                "Input ended inside a record, discarding it"
            );
        }

        tracing::debug!(
            path = %self.source.display(),
            lines = self.stats.lines,
            records = self.stats.records,
            discarded_lines = self.stats.discarded_lines,
            abandoned_records = self.stats.abandoned_records,
            "Segmentation finished"
        );
    }
}

impl<R: BufRead> Iterator for RecordSegmenter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let step = match self.read_line() {
                Ok(Some(line)) => self.step(line),
                Ok(None) => {
                    self.finish();
                    return None;
                }
                Err(e) => Err(e),
            };

            match step {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
