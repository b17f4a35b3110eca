// phi-scan - Residual PHI detection for de-identified clinical notes
// Copyright (c) 2025 phi-scan Contributors
// Licensed under the MIT License

//! # phi-scan - residual PHI detection
//!
//! phi-scan scans de-identified clinical notes for personal health information
//! that survived de-identification (locations, healthcare provider names, phone
//! numbers, dates, ages) and reports, per note, the character offsets of every
//! detected span.
//!
//! ## Overview
//!
//! The input is one flat file of concatenated notes framed by sentinel lines:
//!
//! ```text
//! start_of_record=1||||1||||
//! Patient called 555-123-4567 on 3/4/2020.
//! ||||END_OF_RECORD
//! ```
//!
//! The output is one report per PHI category, a header line per note followed
//! by one `<start> <start> <end>` line per span, in note-relative coordinates.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Record segmentation, report writing, pipeline, observers
//! - [`detector`] - Pattern compiler and span detection
//! - [`lexicon`] - Word, name and place list loading
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use phi_scan::config::SegmenterConfig;
//! use phi_scan::core::{CategoryPass, Pipeline};
//! use phi_scan::detector::{OffsetCorrection, PatternCompiler};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let compiler = PatternCompiler::new();
//!     let passes = vec![
//!         CategoryPass::create(Arc::new(compiler.phone(OffsetCorrection::Structural)?), "phone.phi")?,
//!         CategoryPass::create(Arc::new(compiler.date(OffsetCorrection::Structural)?), "date.phi")?,
//!     ];
//!
//!     // One read of the input feeds both categories
//!     let summaries = Pipeline::new(passes).run_file(Path::new("id.text"), &SegmenterConfig::default());
//!
//!     for summary in summaries {
//!         println!("{}: {} spans", summary.category, summary.spans);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Detecting Spans Directly
//!
//! ```rust
//! use phi_scan::detector::{OffsetCorrection, PatternCompiler};
//! use phi_scan::domain::{Record, RecordId};
//!
//! let header = "start_of_record=1||||1||||\n";
//! let record = Record {
//!     id: RecordId::new("1", "1"),
//!     text: format!("{header}A 91 years old man"),
//!     header_len: header.len(),
//!     first_line: 1,
//! };
//!
//! let age = PatternCompiler::new().age(OffsetCorrection::Structural, 89).unwrap();
//! let spans = age.detect_all(&record).unwrap();
//! assert_eq!((spans[0].start, spans[0].end), (2, 4));
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`] over [`domain::ScanError`];
//! the CLI wraps them in `anyhow` and maps them to exit codes.
//!
//! ## Logging
//!
//! phi-scan uses structured logging with the `tracing` crate. Logs go to
//! stderr; stdout carries only the match trace.

pub mod cli;
pub mod config;
pub mod core;
pub mod detector;
pub mod domain;
pub mod lexicon;
pub mod logging;
