//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::config::DEFAULT_CONFIG_FILE;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub output: String,

    /// Include lexicon-driven detectors and every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing phi-scan configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} and point the lexicons at your list files", self.output);
                println!("  2. Validate configuration: phi-scan validate-config");
                println!("  3. Run a scan: phi-scan scan id.text --output-dir reports");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# phi-scan Configuration File
# Residual PHI detection for de-identified clinical notes

[application]
log_level = "info"

[scan]
output_dir = "."
parallel = true

[[detectors]]
category = "phone"

[[detectors]]
category = "date"

[[detectors]]
category = "age"
age_threshold = 89
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# phi-scan Configuration File
# Residual PHI detection for de-identified clinical notes
#
# Values may reference environment variables as ${VAR_NAME}.
# Any setting can be overridden with PHISCAN_<SECTION>_<KEY>,
# for example PHISCAN_SCAN_OUTPUT_DIR=reports.

[application]
# Log level: trace, debug, info, warn, error
log_level = "info"

[segmenter]
# Reject an end sentinel that has no start sentinel since the previous record.
# When false the most recent patient/note id is reused.
strict = true

# Input encoding label; when unset, UTF-8 with a windows-1252 fallback per line
# input_encoding = "windows-1252"

[scan]
# Directory for report files of detectors without an explicit output
output_dir = "reports"

# Run category passes concurrently (one read of the input per category)
parallel = true

# Read the input once and run every category on each record
single_pass = false

# Write a JSON run summary
# summary_path = "reports/summary.json"

# Backtracking steps a detector may spend on one match attempt
backtrack_limit = 1000000

[trace]
# Print "<patient> <note> <start> <end> <text>" for every match
stdout = true

# Append SHA-256 hashed match records (JSON lines) to an audit file
audit_enabled = false
audit_path = "./audit/phi-trace.jsonl"

[logging]
# Local JSON log files
local_enabled = false
local_path = "./logs"

# Rotation: daily, hourly, never
local_rotation = "daily"

# One entry per category. Lexicon modes:
#   filter     - alphabetic tokens, stop words removed
#   raw-lines  - every line verbatim (multi-word phrases)
#   normalized - alphabetic lines, lowercased, de-duplicated, longest first

[[detectors]]
category = "location"
output = "location.phi"
lexicons = [
    { path = "lists/local_places_ambig.txt", mode = "raw-lines" },
    { path = "lists/local_places_unambig.txt", mode = "raw-lines" },
    { path = "lists/us_states.txt", mode = "raw-lines" },
    { path = "lists/hospitals.txt", mode = "filter" },
]

[[detectors]]
category = "name"
lexicons = [
    { path = "lists/doctor_first_names.txt", mode = "normalized" },
    { path = "lists/doctor_last_names.txt", mode = "normalized" },
]

[[detectors]]
category = "phone"

[[detectors]]
category = "date"

[[detectors]]
category = "age"
# Only ages strictly above the threshold are reported
age_threshold = 89
# Fixed offset correction; the structural offset is used when unset
# offset = 29
"#
        .to_string()
    }
}
