//! Validate config command implementation
//!
//! This module implements the `validate-config` command. Besides schema
//! validation it loads every configured lexicon and compiles every enabled
//! detector, so a run will not fail later on a missing list.

use super::load_or_exit_code;
use crate::config::DEFAULT_CONFIG_FILE;
use crate::detector::PatternCompiler;
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Only validate the file, do not load lexicons or build detectors
    #[arg(long)]
    pub schema_only: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: Option<&Path>) -> anyhow::Result<i32> {
        let shown = config_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        tracing::info!(config_path = %shown, "Validating configuration");

        println!("🔍 Validating configuration: {shown}");
        println!();

        let config = match load_or_exit_code(config_path) {
            Ok(config) => {
                println!("✅ Configuration loaded and validated");
                config
            }
            Err(code) => return Ok(code),
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Strict Segmenter: {}", config.segmenter.strict);
        println!(
            "  Input Encoding: {}",
            config.segmenter.input_encoding.as_deref().unwrap_or("utf-8 (windows-1252 fallback)")
        );
        println!("  Output Directory: {}", config.scan.output_dir.display());
        println!(
            "  Mode: {}",
            if config.scan.single_pass {
                "single pass"
            } else if config.scan.parallel {
                "parallel passes"
            } else {
                "sequential passes"
            }
        );
        println!("  Backtrack Limit: {}", config.scan.backtrack_limit);
        println!("  Stdout Trace: {}", config.trace.stdout);
        if config.trace.audit_enabled {
            println!("  Audit Trace: {}", config.trace.audit_path.display());
        }
        println!();

        let compiler = PatternCompiler::new().with_backtrack_limit(config.scan.backtrack_limit);
        let mut failed = None;
        for detector in &config.detectors {
            let output = detector.output_path(&config.scan.output_dir);
            if !detector.enabled {
                println!("  ⏸  {:<9} disabled", detector.category);
                continue;
            }
            if self.schema_only {
                println!(
                    "  •  {:<9} {} lexicon(s) -> {}",
                    detector.category,
                    detector.lexicons.len(),
                    output.display()
                );
                continue;
            }

            match compiler.compile(detector) {
                Ok(pattern) => println!(
                    "  ✅ {:<9} offset {:?} -> {}",
                    detector.category,
                    pattern.offset(),
                    output.display()
                ),
                Err(e) => {
                    println!("  ❌ {:<9} {e}", detector.category);
                    failed.get_or_insert(e.exit_code());
                }
            }
        }
        println!();

        match failed {
            None => Ok(0),
            Some(code) => {
                println!("❌ Configuration validation failed");
                Ok(code)
            }
        }
    }
}
