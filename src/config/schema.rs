//! Configuration schema types
//!
//! This module defines the configuration structure for phi-scan. Every section
//! has defaults so an absent file still yields a runnable configuration for the
//! structural detectors (phone, date, age).

use crate::detector::compiler::DEFAULT_BACKTRACK_LIMIT;
use crate::detector::{OffsetCorrection, DEFAULT_AGE_THRESHOLD};
use crate::domain::PhiCategory;
use crate::lexicon::LexiconSource;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main phi-scan configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Record segmentation settings
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Run orchestration settings
    #[serde(default)]
    pub scan: ScanSettings,

    /// Match trace (debug observer) settings
    #[serde(default)]
    pub trace: TraceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// One entry per PHI category
    #[serde(default = "default_detectors")]
    pub detectors: Vec<DetectorConfig>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            segmenter: SegmenterConfig::default(),
            scan: ScanSettings::default(),
            trace: TraceConfig::default(),
            logging: LoggingConfig::default(),
            detectors: default_detectors(),
        }
    }
}

impl ScanConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.segmenter.validate()?;
        self.logging.validate()?;

        if self.scan.backtrack_limit == 0 {
            return Err("scan.backtrack_limit must be greater than 0".to_string());
        }

        let mut seen = HashSet::new();
        for detector in &self.detectors {
            if !seen.insert(detector.category) {
                return Err(format!(
                    "Detector '{}' is configured more than once",
                    detector.category
                ));
            }
            detector.validate()?;
        }

        Ok(())
    }

    /// Configuration for one category, if present
    pub fn detector(&self, category: PhiCategory) -> Option<&DetectorConfig> {
        self.detectors.iter().find(|d| d.category == category)
    }

    /// Detectors that will run, in configuration order
    pub fn enabled_detectors(&self) -> impl Iterator<Item = &DetectorConfig> {
        self.detectors.iter().filter(|d| d.enabled)
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Record segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Reject an end sentinel that has no start sentinel since the last record
    #[serde(default = "default_true")]
    pub strict: bool,

    /// Encoding label for the input file (UTF-8 with per-line fallback if unset)
    #[serde(default)]
    pub input_encoding: Option<String>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            strict: true,
            input_encoding: None,
        }
    }
}

impl SegmenterConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some(label) = &self.input_encoding {
            if encoding_rs::Encoding::for_label(label.as_bytes()).is_none() {
                return Err(format!("Unknown segmenter.input_encoding '{label}'"));
            }
        }
        Ok(())
    }
}

/// Run orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Directory report files are written to when a detector has no explicit output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Run category passes concurrently
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Drive every category from a single read of the input
    #[serde(default)]
    pub single_pass: bool,

    /// Write a JSON run summary here
    #[serde(default)]
    pub summary_path: Option<PathBuf>,

    /// Backtracking steps a detector may spend on one match attempt
    #[serde(default = "default_backtrack_limit")]
    pub backtrack_limit: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            parallel: true,
            single_pass: false,
            summary_path: None,
            backtrack_limit: default_backtrack_limit(),
        }
    }
}

/// Match trace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Print every accepted match to standard output
    #[serde(default = "default_true")]
    pub stdout: bool,

    /// Append hashed match records to an audit file
    #[serde(default)]
    pub audit_enabled: bool,

    /// Audit file path (JSON lines)
    #[serde(default = "default_audit_path")]
    pub audit_path: PathBuf,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            audit_enabled: false,
            audit_path: default_audit_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path must be set when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

/// Per-category detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// PHI category this detector reports
    pub category: PhiCategory,

    /// Whether the detector runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Report file; defaults to `<category>.phi` under `scan.output_dir`
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Fixed offset correction; structural when unset
    #[serde(default)]
    pub offset: Option<usize>,

    /// Lexicon files (location and name only)
    #[serde(default)]
    pub lexicons: Vec<LexiconSource>,

    /// Ages at or below this value are not reported (age only)
    #[serde(default)]
    pub age_threshold: Option<u32>,
}

impl DetectorConfig {
    /// Detector with defaults for the category
    pub fn new(category: PhiCategory) -> Self {
        Self {
            category,
            enabled: true,
            output: None,
            offset: None,
            lexicons: Vec::new(),
            age_threshold: None,
        }
    }

    /// Offset correction to compile into the pattern
    pub fn offset_correction(&self) -> OffsetCorrection {
        OffsetCorrection::from(self.offset)
    }

    /// Effective age threshold
    pub fn age_threshold(&self) -> u32 {
        self.age_threshold.unwrap_or(DEFAULT_AGE_THRESHOLD)
    }

    /// Report path, relative outputs resolved against `output_dir`
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        match &self.output {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => output_dir.join(path),
            None => output_dir.join(self.category.default_output()),
        }
    }

    /// Validates this detector entry
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        if !self.category.uses_lexicons() && !self.lexicons.is_empty() {
            return Err(format!(
                "detectors.{}: lexicons are only used by location and name detectors",
                self.category
            ));
        }

        if self.category == PhiCategory::Location && self.lexicons.is_empty() {
            return Err("detectors.location: at least one lexicon is required".to_string());
        }

        if self.age_threshold.is_some() && self.category != PhiCategory::Age {
            return Err(format!(
                "detectors.{}: age_threshold only applies to the age detector",
                self.category
            ));
        }

        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_backtrack_limit() -> usize {
    DEFAULT_BACKTRACK_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("./audit/phi-trace.jsonl")
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

fn default_detectors() -> Vec<DetectorConfig> {
    [PhiCategory::Phone, PhiCategory::Date, PhiCategory::Age]
        .into_iter()
        .map(DetectorConfig::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconMode;

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
        };

        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        let categories: Vec<_> = config.enabled_detectors().map(|d| d.category).collect();
        assert_eq!(
            categories,
            vec![PhiCategory::Phone, PhiCategory::Date, PhiCategory::Age]
        );
    }

    #[test]
    fn test_duplicate_detector_rejected() {
        let mut config = ScanConfig::default();
        config.detectors.push(DetectorConfig::new(PhiCategory::Phone));
        let err = config.validate().unwrap_err();
        assert!(err.contains("more than once"));
    }

    #[test]
    fn test_location_requires_lexicon() {
        let mut detector = DetectorConfig::new(PhiCategory::Location);
        assert!(detector.validate().is_err());

        detector.lexicons = vec![LexiconSource::new("us_states.txt", LexiconMode::Filter)];
        assert!(detector.validate().is_ok());

        detector.lexicons.clear();
        detector.enabled = false;
        assert!(detector.validate().is_ok());
    }

    #[test]
    fn test_name_without_lexicon_is_valid() {
        assert!(DetectorConfig::new(PhiCategory::Name).validate().is_ok());
    }

    #[test]
    fn test_age_threshold_only_for_age() {
        let mut detector = DetectorConfig::new(PhiCategory::Date);
        detector.age_threshold = Some(65);
        assert!(detector.validate().is_err());

        let mut age = DetectorConfig::new(PhiCategory::Age);
        age.age_threshold = Some(65);
        assert!(age.validate().is_ok());
        assert_eq!(age.age_threshold(), 65);
        assert_eq!(DetectorConfig::new(PhiCategory::Age).age_threshold(), 89);
    }

    #[test]
    fn test_output_path_resolution() {
        let dir = Path::new("/tmp/out");
        let mut detector = DetectorConfig::new(PhiCategory::Phone);
        assert_eq!(detector.output_path(dir), PathBuf::from("/tmp/out/phone.phi"));

        detector.output = Some(PathBuf::from("phone_brown.phi"));
        assert_eq!(
            detector.output_path(dir),
            PathBuf::from("/tmp/out/phone_brown.phi")
        );

        detector.output = Some(PathBuf::from("/var/reports/p.phi"));
        assert_eq!(detector.output_path(dir), PathBuf::from("/var/reports/p.phi"));
    }

    #[test]
    fn test_unknown_input_encoding_rejected() {
        let config = SegmenterConfig {
            strict: true,
            input_encoding: Some("klingon-8".to_string()),
        };
        assert!(config.validate().is_err());

        let config = SegmenterConfig {
            strict: true,
            input_encoding: Some("latin1".to_string()),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_rotation_rejected() {
        let config = LoggingConfig {
            local_rotation: "weekly".to_string(),
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
