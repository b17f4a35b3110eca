//! Run summary and reporting
//!
//! Per-category outcomes of a scan plus run-level timing. Serializable so it
//! can be written next to the reports as JSON.

use crate::domain::{PhiCategory, ScanError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Final state of one category pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Completed,
    Failed,
}

/// Outcome of one category pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: PhiCategory,

    /// Report file written
    pub output: PathBuf,

    pub status: PassStatus,

    /// Records whose header was written
    pub records: usize,

    /// Span lines written
    pub spans: usize,

    /// Matches discarded because they fell inside the record framing
    pub dropped_spans: usize,

    /// Error that ended the pass, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Exit code of the error that ended the pass
    #[serde(skip)]
    pub error_code: Option<i32>,
}

impl CategorySummary {
    pub fn new(category: PhiCategory, output: impl Into<PathBuf>) -> Self {
        Self {
            category,
            output: output.into(),
            status: PassStatus::Completed,
            records: 0,
            spans: 0,
            dropped_spans: 0,
            error: None,
            error_code: None,
        }
    }

    /// Mark the pass failed; the first error wins
    pub fn fail(&mut self, error: &ScanError) {
        if self.status == PassStatus::Failed {
            return;
        }
        self.status = PassStatus::Failed;
        self.error = Some(error.to_string());
        self.error_code = Some(error.exit_code());
    }

    pub fn is_successful(&self) -> bool {
        self.status == PassStatus::Completed
    }
}

/// Summary of a whole scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Input file scanned
    pub input: PathBuf,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,

    /// One entry per category, in configuration order
    pub categories: Vec<CategorySummary>,
}

impl RunSummary {
    /// Summary for a run that started at `started_at` and ends now
    pub fn new(
        input: impl Into<PathBuf>,
        started_at: DateTime<Utc>,
        categories: Vec<CategorySummary>,
    ) -> Self {
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        Self {
            input: input.into(),
            started_at,
            finished_at,
            duration_ms,
            categories,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Check if every category completed
    pub fn is_successful(&self) -> bool {
        self.categories.iter().all(CategorySummary::is_successful)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CategorySummary> {
        self.categories.iter().filter(|c| !c.is_successful())
    }

    pub fn total_spans(&self) -> usize {
        self.categories.iter().map(|c| c.spans).sum()
    }

    /// Process exit code: 0 all completed, 3 malformed input, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.is_successful() {
            return 0;
        }

        let malformed = ScanError::MalformedInput {
            line: 0,
            message: String::new(),
        }
        .exit_code();

        if self.failed().any(|c| c.error_code == Some(malformed)) {
            malformed
        } else {
            1
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        for category in &self.categories {
            match &category.error {
                None => tracing::info!(
                    category = %category.category,
                    output = %category.output.display(),
                    records = category.records,
                    spans = category.spans,
                    dropped_spans = category.dropped_spans,
                    "Category completed"
                ),
                Some(error) => tracing::error!(
                    category = %category.category,
                    output = %category.output.display(),
                    records = category.records,
                    error = %error,
                    "Category failed"
                ),
            }
        }

        tracing::info!(
            input = %self.input.display(),
            categories = self.categories.len(),
            failed = self.failed().count(),
            spans = self.total_spans(),
            duration_ms = self.duration_ms,
            "Scan completed"
        );
    }

    /// Write the summary as pretty JSON
    pub fn write_json(&self, path: &Path) -> crate::domain::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScanError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ScanError::Validation(format!("Failed to serialize summary: {e}")))?;
        std::fs::write(path, json).map_err(|e| ScanError::io(path, e))
    }
}
