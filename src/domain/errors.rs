//! Domain error types
//!
//! This module defines the error hierarchy for phi-scan. Every failure is fatal
//! for the category pass it occurs in; nothing here is retried because all work
//! is local file I/O and in-memory matching.

use std::path::PathBuf;
use thiserror::Error;

use super::category::PhiCategory;

/// Main phi-scan error type
///
/// This is the primary error type used throughout the library. The CLI wraps
/// it in `anyhow` at the command boundary.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Input, lexicon, or report file could not be opened, read or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// End sentinel seen with no active record
    #[error("Malformed input at line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    /// A lexicon line could not be decoded with the detected encoding
    #[error("Cannot decode line {line} of {} as {encoding}", path.display())]
    Encoding {
        path: PathBuf,
        line: usize,
        encoding: String,
    },

    /// Matcher construction or execution failed
    #[error("Pattern error for {category}: {message}")]
    Pattern {
        category: PhiCategory,
        message: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ScanError {
    /// Wraps an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps a matcher error for the given category
    pub fn pattern(category: PhiCategory, message: impl ToString) -> Self {
        Self::Pattern {
            category,
            message: message.to_string(),
        }
    }

    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Validation(_) | Self::Pattern { .. } => 2,
            Self::MalformedInput { .. } => 3,
            Self::Io { .. } | Self::Encoding { .. } => 5,
        }
    }
}
