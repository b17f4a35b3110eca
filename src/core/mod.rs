//! Core scanning logic for phi-scan.
//!
//! # Modules
//!
//! - [`segmenter`] - Splits the input stream into sentinel-delimited records
//! - [`report`] - Writes the per-category report files
//! - [`trace`] - Optional observers for accepted matches (debug trace, audit)
//! - [`pipeline`] - Drives one segmenter over one or more category passes
//! - [`summary`] - Per-category and run-level outcomes
//!
//! # Scan Workflow
//!
//! 1. **Compile**: build one [`Pattern`](crate::detector::Pattern) per category
//! 2. **Segment**: read the input line by line into records
//! 3. **Detect**: scan each record with every active category pattern
//! 4. **Report**: write the record header, then one line per span
//! 5. **Summarize**: collect per-category counts and failures
//!
//! # Example
//!
//! ```rust,no_run
//! use phi_scan::config::SegmenterConfig;
//! use phi_scan::core::pipeline::{CategoryPass, Pipeline};
//! use phi_scan::detector::{OffsetCorrection, PatternCompiler};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn example() -> phi_scan::domain::Result<()> {
//! let phone = Arc::new(PatternCompiler::new().phone(OffsetCorrection::Structural)?);
//! let pass = CategoryPass::create(phone, "phone.phi")?;
//!
//! let summaries = Pipeline::new(vec![pass])
//!     .run_file(Path::new("id.text"), &SegmenterConfig::default());
//!
//! println!("Spans: {}", summaries[0].spans);
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod report;
pub mod segmenter;
pub mod summary;
pub mod trace;

pub use pipeline::{CategoryPass, Pipeline};
pub use report::ReportWriter;
pub use segmenter::{LineDecoder, RecordSegmenter, SegmenterStats};
pub use summary::{CategorySummary, PassStatus, RunSummary};
pub use trace::{AuditTrace, MatchObserver, StdoutTrace};
