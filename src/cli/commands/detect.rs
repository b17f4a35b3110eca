//! Detect command implementation
//!
//! Runs a single PHI category over an input file, the per-category entry point
//! taking `<input> <output>` positionally.

use super::{build_observer, load_or_exit_code, open_audit};
use crate::config::DetectorConfig;
use crate::core::pipeline::{CategoryPass, Pipeline};
use crate::core::summary::RunSummary;
use crate::detector::{legacy_offset, PatternCompiler};
use crate::domain::PhiCategory;
use crate::{log_error_with_context, log_pass_start};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// PHI category (location, name, phone, date, age)
    pub category: PhiCategory,

    /// Input file of sentinel-delimited notes
    pub input: PathBuf,

    /// Report file to write
    pub output: PathBuf,

    /// Fixed offset correction instead of the structural one
    #[arg(long, conflicts_with = "legacy_offset")]
    pub offset: Option<usize>,

    /// Use the historical fixed offset for the category (27, or 29 for age)
    #[arg(long)]
    pub legacy_offset: bool,

    /// Report ages strictly above this value (age only)
    #[arg(long)]
    pub age_threshold: Option<u32>,

    /// Do not print matches to standard output
    #[arg(long)]
    pub no_trace: bool,
}

impl DetectArgs {
    /// Detector settings: the configured entry for the category plus CLI overrides
    fn detector(&self, configured: Option<&DetectorConfig>) -> DetectorConfig {
        let mut detector = configured
            .cloned()
            .unwrap_or_else(|| DetectorConfig::new(self.category));

        detector.enabled = true;
        detector.output = Some(self.output.clone());
        if let Some(offset) = self.offset {
            detector.offset = Some(offset);
        } else if self.legacy_offset {
            detector.offset = Some(legacy_offset(self.category));
        }
        if let Some(threshold) = self.age_threshold {
            detector.age_threshold = Some(threshold);
        }
        detector
    }

    /// Execute the detect command
    pub async fn execute(&self, config_path: Option<&Path>) -> anyhow::Result<i32> {
        tracing::info!(category = %self.category, "Starting detect command");

        let config = match load_or_exit_code(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };

        let detector = self.detector(config.detector(self.category));
        if let Err(e) = detector.validate() {
            tracing::error!(error = %e, "Detector configuration invalid");
            eprintln!("❌ Configuration validation failed: {e}");
            return Ok(2);
        }

        let compiler = PatternCompiler::new().with_backtrack_limit(config.scan.backtrack_limit);
        let pattern = match compiler.compile(&detector) {
            Ok(pattern) => Arc::new(pattern),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build detector");
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        let audit = match open_audit(&config.trace) {
            Ok(audit) => audit,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        log_pass_start!(self.category, self.input, self.output);
        let started_at = chrono::Utc::now();

        let pass = match CategoryPass::create(pattern, &self.output) {
            Ok(pass) => pass,
            Err(e) => {
                log_error_with_context!(e, "Failed to create report");
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        let mut pipeline = Pipeline::new(vec![pass]);
        if let Some(observer) = build_observer(&config.trace, audit.as_ref(), self.no_trace) {
            pipeline = pipeline.with_observer(observer);
        }

        let input = self.input.clone();
        let segmenter = config.segmenter.clone();
        let categories =
            tokio::task::spawn_blocking(move || pipeline.run_file(&input, &segmenter)).await?;

        let summary = RunSummary::new(&self.input, started_at, categories);
        summary.log_summary();

        let code = summary
            .categories
            .iter()
            .find_map(|c| c.error.as_ref().map(|e| (e, c.error_code)));
        match code {
            None => Ok(0),
            Some((error, code)) => {
                eprintln!("❌ {} detection failed: {error}", self.category);
                Ok(code.unwrap_or(1))
            }
        }
    }
}
