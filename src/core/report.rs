//! Report writer
//!
//! One report per PHI category, opened once per run and written
//! sequentially:
//!
//! ```text
//! Patient <patientId>\tNote <noteId>
//! <start> <start> <end>
//! ```
//!
//! The duplicated start column is part of the legacy three-column format
//! consumed by downstream scoring tools.

use crate::domain::{MatchSpan, RecordId, Result, ScanError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sequential writer for one category report
pub struct ReportWriter<W: Write> {
    out: W,
    path: PathBuf,
    records: usize,
    spans: usize,
    in_record: bool,
}

impl ReportWriter<BufWriter<File>> {
    /// Create (truncate) a report file, creating parent directories
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScanError::io(parent, e))?;
        }

        let file = File::create(path).map_err(|e| ScanError::io(path, e))?;
        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl<W: Write> ReportWriter<W> {
    /// Wrap any writer; `path` names it in errors
    pub fn new(out: W, path: impl Into<PathBuf>) -> Self {
        Self {
            out,
            path: path.into(),
            records: 0,
            spans: 0,
            in_record: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records whose header has been written
    pub fn records(&self) -> usize {
        self.records
    }

    /// Span lines written
    pub fn spans(&self) -> usize {
        self.spans
    }

    /// Write the header line for a record
    pub fn begin_record(&mut self, id: &RecordId) -> Result<()> {
        writeln!(self.out, "{id}").map_err(|e| ScanError::io(&self.path, e))?;
        self.records += 1;
        self.in_record = true;
        Ok(())
    }

    /// Write one span line for the current record
    pub fn write_span(&mut self, span: &MatchSpan) -> Result<()> {
        if !self.in_record {
            return Err(ScanError::Validation(format!(
                "span {}..{} written to {} before any record header",
                span.start,
                span.end,
                self.path.display()
            )));
        }

        writeln!(self.out, "{} {} {}", span.start, span.start, span.end)
            .map_err(|e| ScanError::io(&self.path, e))?;
        self.spans += 1;
        Ok(())
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.out.flush().map_err(|e| ScanError::io(&self.path, e))?;
        tracing::debug!(
            path = %self.path.display(),
            records = self.records,
            spans = self.spans,
            "Report finished"
        );
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(write: impl FnOnce(&mut ReportWriter<Vec<u8>>)) -> String {
        let mut writer = ReportWriter::new(Vec::new(), "phone.phi");
        write(&mut writer);
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_header_and_spans() {
        let out = render(|w| {
            w.begin_record(&RecordId::new("1", "1")).unwrap();
            w.write_span(&MatchSpan::new(15, 27, "555-123-4567")).unwrap();
            w.write_span(&MatchSpan::new(31, 39, "3/4/2020")).unwrap();
        });
        assert_eq!(out, "Patient 1\tNote 1\n15 15 27\n31 31 39\n");
    }

    #[test]
    fn test_record_without_spans_is_header_only() {
        let out = render(|w| {
            w.begin_record(&RecordId::new("1", "1")).unwrap();
            w.begin_record(&RecordId::new("1", "2")).unwrap();
        });
        assert_eq!(out, "Patient 1\tNote 1\nPatient 1\tNote 2\n");
    }

    #[test]
    fn test_span_before_header_rejected() {
        let mut writer = ReportWriter::new(Vec::new(), "age.phi");
        let result = writer.write_span(&MatchSpan::new(0, 2, "91"));
        assert!(matches!(result, Err(ScanError::Validation(_))));
        assert_eq!(writer.spans(), 0);
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reports").join("date.phi");

        let mut writer = ReportWriter::create(&path).unwrap();
        writer.begin_record(&RecordId::new("3", "4")).unwrap();
        writer.finish().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Patient 3\tNote 4\n");
    }
}
