//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for phi-scan using clap.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::Path;

/// phi-scan - residual PHI detection for de-identified clinical notes
#[derive(Parser, Debug)]
#[command(name = "phi-scan")]
#[command(version, about, long_about = None)]
#[command(author = "phi-scan Contributors")]
pub struct Cli {
    /// Path to configuration file (defaults to ./phi-scan.toml when present)
    #[arg(short, long, global = true, env = "PHISCAN_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "PHISCAN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref().map(Path::new)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one PHI category over an input file
    Detect(commands::detect::DetectArgs),

    /// Run every enabled category over an input file
    Scan(commands::scan::ScanArgs),

    /// Validate configuration file, lexicons and detectors
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PhiCategory;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parse_detect() {
        let cli = Cli::parse_from(["phi-scan", "detect", "phone", "id.text", "phone.phi"]);
        match cli.command {
            Commands::Detect(args) => {
                assert_eq!(args.category, PhiCategory::Phone);
                assert_eq!(args.input, PathBuf::from("id.text"));
                assert_eq!(args.output, PathBuf::from("phone.phi"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_detect_alias() {
        let cli = Cli::parse_from(["phi-scan", "detect", "hcp", "id.text", "name.phi"]);
        assert!(matches!(
            cli.command,
            Commands::Detect(ref args) if args.category == PhiCategory::Name
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["phi-scan", "detect", "ssn", "id.text", "x.phi"]).is_err());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["phi-scan", "scan", "id.text", "--config", "custom.toml"]);
        assert_eq!(cli.config_path(), Some(Path::new("custom.toml")));
        assert!(matches!(cli.command, Commands::Scan(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["phi-scan", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["phi-scan", "init", "--force"]);
        assert!(matches!(cli.command, Commands::Init(ref args) if args.force));
    }
}
