//! Settings and input validation
//!
//! A small fluent validator that collects every failure instead of stopping at
//! the first one, so the CLI can show the complete list of problems.
//!
//! # Example
//!
//! ```rust
//! use ofeed_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("ofeed.event_id", "")
//!     .range("sidroid.port", 80u16, 1025, 65535)
//!     .validate();
//!
//! assert!(!result.is_valid());
//! assert_eq!(result.errors().len(), 2);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    #[must_use]
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Check whether a specific field failed
    #[must_use]
    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Convert to Result type
    ///
    /// # Errors
    ///
    /// Returns a configuration validation error listing every failed field.
    pub fn to_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
            Err(Error::not_configured(messages.join("; ")))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    #[must_use]
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate that a field is not empty
    #[must_use]
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Field is required".to_string(),
                code: "REQUIRED".to_string(),
                expected: Some("non-empty value".to_string()),
                actual: Some("empty".to_string()),
            });
        }
        self
    }

    /// Validate that a value starts with a prefix, e.g. a URL scheme
    ///
    /// Empty values are left to [`Validator::required`].
    #[must_use]
    pub fn starts_with(mut self, field: &str, value: &str, prefix: &str) -> Self {
        if !value.is_empty() && !value.starts_with(prefix) {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must start with {prefix}"),
                code: "PREFIX".to_string(),
                expected: Some(format!("{prefix}...")),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Validate a numeric range (inclusive)
    #[must_use]
    pub fn range<T: PartialOrd + std::fmt::Display>(
        mut self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        if value < min || value > max {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be between {min} and {max}"),
                code: "RANGE".to_string(),
                expected: Some(format!("{min} - {max}")),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Add a custom validation
    #[must_use]
    pub fn custom<F>(mut self, field: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(message) = f() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message,
                code: "CUSTOM".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Add a warning if condition is true
    #[must_use]
    pub fn warn_if(mut self, field: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code: "WARNING".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Finish and return the collected result
    #[must_use]
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_validation() {
        let result = Validator::new().required("id", "  ").validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "REQUIRED");
    }

    #[test]
    fn test_starts_with_skips_empty() {
        let result = Validator::new()
            .starts_with("server", "", "https://")
            .validate();
        assert!(result.is_valid());

        let result = Validator::new()
            .starts_with("server", "http://example.com", "https://")
            .validate();
        assert!(result.has_error_for("server"));
    }

    #[test]
    fn test_range_validation() {
        assert!(Validator::new().range("port", 8080, 1025, 65535).validate().is_valid());
        assert!(!Validator::new().range("port", 1024, 1025, 65535).validate().is_valid());
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let result = Validator::new()
            .warn_if("timeout", true, "No timeout set")
            .validate();
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_to_result_lists_all_fields() {
        let err = Validator::new()
            .required("ofeed.event_id", "")
            .required("ofeed.event_password", "")
            .validate()
            .to_result()
            .unwrap_err();

        let context = err.context.unwrap();
        assert!(context.contains("ofeed.event_id"));
        assert!(context.contains("ofeed.event_password"));
    }
}
