//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels (`--log-level`, `RUST_LOG`)
//! - Console output on stderr
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use phi_scan::logging::init_logging;
//! use phi_scan::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Scan started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a category pass
///
/// # Example
///
/// ```no_run
/// use phi_scan::log_pass_start;
/// use phi_scan::domain::PhiCategory;
/// use std::path::Path;
///
/// log_pass_start!(PhiCategory::Phone, Path::new("id.text"), Path::new("phone.phi"));
/// ```
#[macro_export]
macro_rules! log_pass_start {
    ($category:expr, $input:expr, $output:expr) => {
        tracing::info!(
            category = %$category,
            input = %$input.display(),
            output = %$output.display(),
            "Starting category pass"
        );
    };
}

/// Log the completion of a scan
///
/// # Example
///
/// ```no_run
/// use phi_scan::log_scan_complete;
/// use std::time::Duration;
///
/// log_scan_complete!(5, 120, Duration::from_secs(3));
/// ```
#[macro_export]
macro_rules! log_scan_complete {
    ($categories:expr, $spans:expr, $duration:expr) => {
        tracing::info!(
            categories = $categories,
            spans = $spans,
            duration_ms = $duration.as_millis(),
            "Scan completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use phi_scan::log_error_with_context;
/// use phi_scan::domain::ScanError;
///
/// let error = ScanError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::{PhiCategory, ScanError};
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn test_macros_expand() {
        // No subscriber is installed; this only checks the macros expand
        log_pass_start!(PhiCategory::Date, Path::new("id.text"), Path::new("date.phi"));
        log_scan_complete!(2, 10usize, Duration::from_millis(5));
        log_error_with_context!(&ScanError::Validation("x".into()), "context");
    }
}
