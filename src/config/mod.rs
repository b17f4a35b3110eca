//! Configuration management for phi-scan.
//!
//! # Overview
//!
//! phi-scan uses an optional TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PHISCAN_*` environment overrides
//! - Default values for every section
//! - Validation on load
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`SegmenterConfig`] - Sentinel strictness and input encoding
//! - [`ScanSettings`] - Output directory, parallelism, summary file
//! - [`TraceConfig`] - Match trace to stdout and hashed audit file
//! - [`LoggingConfig`] - Local log files
//! - [`DetectorConfig`] - One entry per PHI category
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [scan]
//! output_dir = "reports"
//!
//! [[detectors]]
//! category = "location"
//! lexicons = [
//!     { path = "${PHISCAN_LISTS}/us_states.txt", mode = "filter" },
//!     { path = "${PHISCAN_LISTS}/local_places_unambig.txt", mode = "raw-lines" },
//! ]
//!
//! [[detectors]]
//! category = "name"
//! lexicons = [{ path = "${PHISCAN_LISTS}/doctor_last_names.txt", mode = "normalized" }]
//!
//! [[detectors]]
//! category = "age"
//! age_threshold = 89
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_or_default, DEFAULT_CONFIG_FILE};
pub use schema::{
    ApplicationConfig, DetectorConfig, LoggingConfig, ScanConfig, ScanSettings, SegmenterConfig,
    TraceConfig,
};
