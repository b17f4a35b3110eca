//! Match observers
//!
//! Detection never prints. Every accepted span is handed to a
//! [`MatchObserver`], which may print a debug trace or append a hashed audit
//! entry. Observers are optional and never affect report contents.

use crate::domain::{MatchSpan, PhiCategory, RecordId, Result, ScanError};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Sink for accepted matches
pub trait MatchObserver: Send {
    fn on_match(&mut self, category: PhiCategory, record: &RecordId, span: &MatchSpan)
        -> Result<()>;

    /// Flush anything buffered
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl MatchObserver for Vec<Box<dyn MatchObserver>> {
    fn on_match(
        &mut self,
        category: PhiCategory,
        record: &RecordId,
        span: &MatchSpan,
    ) -> Result<()> {
        for observer in self.iter_mut() {
            observer.on_match(category, record, span)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for observer in self.iter_mut() {
            observer.flush()?;
        }
        Ok(())
    }
}

/// Debug trace line `<patientId> <noteId> <start> <end> <matchedText>`
pub struct StdoutTrace<W: Write + Send = io::Stdout> {
    out: W,
}

impl StdoutTrace<io::Stdout> {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for StdoutTrace<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> StdoutTrace<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> MatchObserver for StdoutTrace<W> {
    fn on_match(
        &mut self,
        _category: PhiCategory,
        record: &RecordId,
        span: &MatchSpan,
    ) -> Result<()> {
        writeln!(
            self.out,
            "{} {} {} {} {}",
            record.patient_id, record.note_id, span.start, span.end, span.text
        )
        .map_err(|e| ScanError::io("<stdout>", e))
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(|e| ScanError::io("<stdout>", e))
    }
}

/// Audit entry; the matched text is stored only as a SHA-256 digest
#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: String,
    category: PhiCategory,
    patient_id: &'a str,
    note_id: &'a str,
    start: usize,
    end: usize,
    /// SHA-256 of the matched text (never the plaintext PHI)
    text_hash: String,
}

/// JSON-lines audit trail shared by every category pass of a run
#[derive(Clone)]
pub struct AuditTrace {
    path: PathBuf,
    sink: Arc<Mutex<BufWriter<File>>>,
}

impl AuditTrace {
    /// Open the audit file for appending, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScanError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ScanError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            sink: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, line: &str) -> Result<()> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| ScanError::Validation("audit trace lock poisoned".to_string()))?;
        writeln!(sink, "{line}").map_err(|e| ScanError::io(&self.path, e))
    }
}

/// Hex SHA-256 of a matched value
pub fn hash_text(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl MatchObserver for AuditTrace {
    fn on_match(
        &mut self,
        category: PhiCategory,
        record: &RecordId,
        span: &MatchSpan,
    ) -> Result<()> {
        let entry = AuditEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            category,
            patient_id: &record.patient_id,
            note_id: &record.note_id,
            start: span.start,
            end: span.end,
            text_hash: hash_text(&span.text),
        };

        let line = serde_json::to_string(&entry)
            .map_err(|e| ScanError::Validation(format!("Failed to serialize audit entry: {e}")))?;
        self.write_line(&line)
    }

    fn flush(&mut self) -> Result<()> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| ScanError::Validation("audit trace lock poisoned".to_string()))?;
        sink.flush().map_err(|e| ScanError::io(&self.path, e))
    }
}
