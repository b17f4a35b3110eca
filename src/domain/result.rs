//! Result type alias for phi-scan
//!
//! This module provides a convenient Result type alias that uses ScanError
//! as the error type.

use super::errors::ScanError;

/// Result type alias for phi-scan operations
///
/// # Examples
///
/// ```
/// use phi_scan::domain::result::Result;
/// use phi_scan::domain::errors::ScanError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ScanError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ScanError;

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(ScanError::Validation("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
