//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ScanConfig;
use crate::domain::errors::ScanError;
use crate::domain::result::Result;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

/// Configuration file looked up when none is given explicitly
pub const DEFAULT_CONFIG_FILE: &str = "phi-scan.toml";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ScanConfig
/// 4. Applies environment variable overrides (PHISCAN_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use phi_scan::config::loader::load_config;
///
/// let config = load_config("phi-scan.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ScanConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ScanError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ScanError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&contents)?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Loads an explicit configuration file, or the default file if present,
/// or built-in defaults
///
/// Environment overrides and validation apply in every case.
pub fn load_config_or_default(path: Option<&Path>) -> Result<ScanConfig> {
    if let Some(path) = path {
        return load_config(path);
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        return load_config(default_path);
    }

    tracing::debug!("No configuration file found, using built-in defaults");
    let mut config = ScanConfig::default();
    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Parses TOML content (with `${VAR}` substitution), applies overrides and validates
pub fn parse_config(contents: &str) -> Result<ScanConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ScanConfig = toml::from_str(&contents)
        .map_err(|e| ScanError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &ScanConfig) -> Result<()> {
    config.validate().map_err(|e| {
        ScanError::Configuration(format!("Configuration validation failed: {}", e))
    })
}

fn env_placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static placeholder pattern is valid")
    })
}

/// Substitutes `${VAR_NAME}` placeholders outside comment lines
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut missing: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            env_placeholder()
                .replace_all(line, |caps: &Captures<'_>| match std::env::var(&caps[1]) {
                    Ok(value) => value,
                    Err(_) => {
                        if !missing.iter().any(|name| name == &caps[1]) {
                            missing.push(caps[1].to_string());
                        }
                        caps[0].to_string()
                    }
                })
                .into_owned()
        })
        .collect();

    if !missing.is_empty() {
        return Err(ScanError::Configuration(format!(
            "Missing required environment variables: {}",
            missing.join(", ")
        )));
    }

    let mut result = lines.join("\n");
    result.push('\n');
    Ok(result)
}

/// Applies environment variable overrides using PHISCAN_* prefix
///
/// Environment variables follow the pattern: PHISCAN_<SECTION>_<KEY>
/// For example: PHISCAN_APPLICATION_LOG_LEVEL, PHISCAN_SCAN_OUTPUT_DIR
fn apply_env_overrides(config: &mut ScanConfig) -> Result<()> {
    if let Ok(val) = std::env::var("PHISCAN_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("PHISCAN_SEGMENTER_STRICT") {
        config.segmenter.strict = parse_env("PHISCAN_SEGMENTER_STRICT", &val)?;
    }
    if let Ok(val) = std::env::var("PHISCAN_SEGMENTER_INPUT_ENCODING") {
        config.segmenter.input_encoding = Some(val);
    }

    if let Ok(val) = std::env::var("PHISCAN_SCAN_OUTPUT_DIR") {
        config.scan.output_dir = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("PHISCAN_SCAN_PARALLEL") {
        config.scan.parallel = parse_env("PHISCAN_SCAN_PARALLEL", &val)?;
    }
    if let Ok(val) = std::env::var("PHISCAN_SCAN_SINGLE_PASS") {
        config.scan.single_pass = parse_env("PHISCAN_SCAN_SINGLE_PASS", &val)?;
    }
    if let Ok(val) = std::env::var("PHISCAN_SCAN_BACKTRACK_LIMIT") {
        config.scan.backtrack_limit = parse_env("PHISCAN_SCAN_BACKTRACK_LIMIT", &val)?;
    }

    if let Ok(val) = std::env::var("PHISCAN_TRACE_STDOUT") {
        config.trace.stdout = parse_env("PHISCAN_TRACE_STDOUT", &val)?;
    }
    if let Ok(val) = std::env::var("PHISCAN_TRACE_AUDIT_ENABLED") {
        config.trace.audit_enabled = parse_env("PHISCAN_TRACE_AUDIT_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("PHISCAN_TRACE_AUDIT_PATH") {
        config.trace.audit_path = PathBuf::from(val);
    }

    if let Ok(val) = std::env::var("PHISCAN_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("PHISCAN_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("PHISCAN_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ScanError::Configuration(format!("Invalid {name} value: {value}")))
}
