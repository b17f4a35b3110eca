//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod detect;
pub mod init;
pub mod scan;
pub mod validate;

use crate::config::{load_config_or_default, ScanConfig, TraceConfig};
use crate::core::trace::{AuditTrace, MatchObserver, StdoutTrace};
use crate::log_error_with_context;
use std::path::Path;

/// Load configuration, mapping failure to an exit code after reporting it
pub(crate) fn load_or_exit_code(config_path: Option<&Path>) -> Result<ScanConfig, i32> {
    load_config_or_default(config_path).map_err(|e| {
        log_error_with_context!(e, "Failed to load configuration");
        eprintln!("❌ {e}");
        e.exit_code()
    })
}

/// Observers for one pipeline according to the trace settings
pub(crate) fn build_observer(
    trace: &TraceConfig,
    audit: Option<&AuditTrace>,
    no_trace: bool,
) -> Option<Box<dyn MatchObserver>> {
    let mut observers: Vec<Box<dyn MatchObserver>> = Vec::new();

    if trace.stdout && !no_trace {
        observers.push(Box::new(StdoutTrace::new()));
    }
    if let Some(audit) = audit {
        observers.push(Box::new(audit.clone()));
    }

    if observers.is_empty() {
        None
    } else {
        Some(Box::new(observers))
    }
}

/// Open the audit trail if enabled
pub(crate) fn open_audit(trace: &TraceConfig) -> crate::domain::Result<Option<AuditTrace>> {
    if !trace.audit_enabled {
        return Ok(None);
    }
    let audit = AuditTrace::open(&trace.audit_path)?;
    tracing::info!(path = %audit.path().display(), "Audit trace enabled");
    Ok(Some(audit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_observer_respects_flags() {
        let mut trace = TraceConfig::default();
        assert!(build_observer(&trace, None, false).is_some());
        assert!(build_observer(&trace, None, true).is_none());

        trace.stdout = false;
        assert!(build_observer(&trace, None, false).is_none());
    }

    #[test]
    fn test_open_audit_disabled() {
        assert!(open_audit(&TraceConfig::default()).unwrap().is_none());
    }
}
