//! Scan command implementation
//!
//! Runs every enabled detector over one input file. By default each category
//! is an independent pass over the input (own reader, own report) and passes
//! run concurrently on the blocking pool. `--single-pass` drives every category
//! from one read of the input instead.

use super::{build_observer, load_or_exit_code, open_audit};
use crate::config::{DetectorConfig, ScanConfig};
use crate::core::pipeline::{CategoryPass, Pipeline};
use crate::core::summary::{CategorySummary, RunSummary};
use crate::core::trace::AuditTrace;
use crate::detector::{legacy_offset, Pattern, PatternCompiler};
use crate::domain::PhiCategory;
use crate::{log_error_with_context, log_pass_start, log_scan_complete};
use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Input file of sentinel-delimited notes
    pub input: PathBuf,

    /// Directory for report files (overrides scan.output_dir)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Read the input once and run every category on each record
    #[arg(long)]
    pub single_pass: bool,

    /// Run category passes one after another
    #[arg(long)]
    pub sequential: bool,

    /// Write a JSON run summary to this file
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Do not print matches to standard output
    #[arg(long)]
    pub no_trace: bool,

    /// Use the historical fixed offsets (27, or 29 for age) for detectors
    /// without a configured offset
    #[arg(long)]
    pub legacy_offset: bool,

    /// Only run these categories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<PhiCategory>,
}

/// A compiled detector and where its report goes
struct Target {
    category: PhiCategory,
    pattern: Arc<Pattern>,
    output: PathBuf,
}

impl ScanArgs {
    fn apply_overrides(&self, config: &mut ScanConfig) {
        if let Some(dir) = &self.output_dir {
            tracing::info!(output_dir = %dir.display(), "Overriding output directory from CLI");
            config.scan.output_dir = dir.clone();
        }
        if self.single_pass {
            config.scan.single_pass = true;
        }
        if self.sequential {
            config.scan.parallel = false;
        }
        if let Some(path) = &self.summary {
            config.scan.summary_path = Some(path.clone());
        }
        if self.legacy_offset {
            for detector in &mut config.detectors {
                detector.offset.get_or_insert(legacy_offset(detector.category));
            }
        }
        if !self.only.is_empty() {
            for detector in &mut config.detectors {
                detector.enabled = detector.enabled && self.only.contains(&detector.category);
            }
        }
    }

    fn selected<'a>(&self, config: &'a ScanConfig) -> Vec<&'a DetectorConfig> {
        config.enabled_detectors().collect()
    }

    /// Execute the scan command
    pub async fn execute(&self, config_path: Option<&Path>) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting scan command");

        let mut config = match load_or_exit_code(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        self.apply_overrides(&mut config);

        let detectors = self.selected(&config);
        if detectors.is_empty() {
            eprintln!("❌ No detectors enabled");
            return Ok(2);
        }

        // Every detector is built before any input is read
        let compiler = PatternCompiler::new().with_backtrack_limit(config.scan.backtrack_limit);
        let mut targets = Vec::with_capacity(detectors.len());
        for detector in detectors {
            match compiler.compile(detector) {
                Ok(pattern) => targets.push(Target {
                    category: detector.category,
                    pattern: Arc::new(pattern),
                    output: detector.output_path(&config.scan.output_dir),
                }),
                Err(e) => {
                    tracing::error!(category = %detector.category, error = %e, "Failed to build detector");
                    eprintln!("❌ {e}");
                    return Ok(e.exit_code());
                }
            }
        }

        let audit = match open_audit(&config.trace) {
            Ok(audit) => audit,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        let started_at = chrono::Utc::now();
        let categories = if config.scan.single_pass {
            self.run_single_pass(&config, targets, audit.as_ref()).await?
        } else if config.scan.parallel {
            self.run_parallel(&config, targets, audit.as_ref()).await?
        } else {
            self.run_sequential(&config, targets, audit.as_ref())
        };

        let summary = RunSummary::new(&self.input, started_at, categories);
        summary.log_summary();
        log_scan_complete!(summary.categories.len(), summary.total_spans(), summary.duration());
        print_summary(&summary);

        if let Some(path) = &config.scan.summary_path {
            if let Err(e) = summary.write_json(path) {
                log_error_with_context!(e, "Failed to write run summary");
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        }

        Ok(summary.exit_code())
    }

    /// One pipeline per category
    fn pipeline_for(
        &self,
        config: &ScanConfig,
        target: Target,
        audit: Option<&AuditTrace>,
    ) -> Result<Pipeline<BufWriter<File>>, CategorySummary> {
        log_pass_start!(target.category, self.input, target.output);

        let pass = CategoryPass::create(target.pattern, &target.output).map_err(|e| {
            tracing::error!(category = %target.category, error = %e, "Failed to create report");
            let mut summary = CategorySummary::new(target.category, &target.output);
            summary.fail(&e);
            summary
        })?;

        let mut pipeline = Pipeline::new(vec![pass]);
        if let Some(observer) = build_observer(&config.trace, audit, self.no_trace) {
            pipeline = pipeline.with_observer(observer);
        }
        Ok(pipeline)
    }

    fn run_sequential(
        &self,
        config: &ScanConfig,
        targets: Vec<Target>,
        audit: Option<&AuditTrace>,
    ) -> Vec<CategorySummary> {
        let mut categories = Vec::with_capacity(targets.len());
        for target in targets {
            match self.pipeline_for(config, target, audit) {
                Ok(pipeline) => categories.extend(pipeline.run_file(&self.input, &config.segmenter)),
                Err(failed) => categories.push(failed),
            }
        }
        categories
    }

    async fn run_parallel(
        &self,
        config: &ScanConfig,
        targets: Vec<Target>,
        audit: Option<&AuditTrace>,
    ) -> anyhow::Result<Vec<CategorySummary>> {
        let mut handles = Vec::with_capacity(targets.len());
        for target in targets {
            let handle = match self.pipeline_for(config, target, audit) {
                Ok(pipeline) => {
                    let input = self.input.clone();
                    let segmenter = config.segmenter.clone();
                    Ok(tokio::task::spawn_blocking(move || {
                        pipeline.run_file(&input, &segmenter)
                    }))
                }
                Err(failed) => Err(failed),
            };
            handles.push(handle);
        }

        // Joined in configuration order so the summary order is stable
        let mut categories = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle {
                Ok(task) => categories.extend(task.await?),
                Err(failed) => categories.push(failed),
            }
        }
        Ok(categories)
    }

    async fn run_single_pass(
        &self,
        config: &ScanConfig,
        targets: Vec<Target>,
        audit: Option<&AuditTrace>,
    ) -> anyhow::Result<Vec<CategorySummary>> {
        let mut passes = Vec::with_capacity(targets.len());
        let mut failed = Vec::new();
        for target in targets {
            log_pass_start!(target.category, self.input, target.output);
            match CategoryPass::create(target.pattern, &target.output) {
                Ok(pass) => passes.push(pass),
                Err(e) => {
                    let mut summary = CategorySummary::new(target.category, &target.output);
                    summary.fail(&e);
                    failed.push(summary);
                }
            }
        }

        let mut categories = if passes.is_empty() {
            Vec::new()
        } else {
            let mut pipeline = Pipeline::new(passes);
            if let Some(observer) = build_observer(&config.trace, audit, self.no_trace) {
                pipeline = pipeline.with_observer(observer);
            }
            let input = self.input.clone();
            let segmenter = config.segmenter.clone();
            tokio::task::spawn_blocking(move || pipeline.run_file(&input, &segmenter)).await?
        };
        categories.extend(failed);
        Ok(categories)
    }
}

fn print_summary(summary: &RunSummary) {
    eprintln!();
    eprintln!("📊 Scan Summary");
    eprintln!("================");
    for category in &summary.categories {
        match &category.error {
            None => eprintln!(
                "  ✅ {:<9} {} records, {} spans -> {}",
                category.category,
                category.records,
                category.spans,
                category.output.display()
            ),
            Some(error) => eprintln!("  ❌ {:<9} {error}", category.category),
        }
    }
    eprintln!("  Duration: {:.2}s", summary.duration().as_secs_f64());
}
