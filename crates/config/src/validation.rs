//! Validation system for configuration values
//!
//! Each config section implements [`ConfigSection`]; the root [`crate::Config`]
//! collects the errors of every section so a user sees all problems at once.

pub use crate::error::ValidationError;

/// Trait for configuration sections that can validate themselves
pub trait ConfigSection: Default {
    /// Validates the configuration section
    ///
    /// Returns a list of validation errors. Empty list means valid.
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Returns the section name for error reporting
    fn section_name(&self) -> &'static str;
}

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a numeric value is within a range
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates that a string is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Validates a platform identifier (user id or username)
    ///
    /// Blank is allowed and means "not configured"; anything else must be
    /// usable as a single URL path segment.
    pub fn identifier(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.chars().any(|c| c.is_whitespace() || c == '/') {
            Err(ValidationError::with_value(
                field,
                "must not contain whitespace or '/'",
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates that an optional numeric id contains only ASCII digits
    pub fn digits(value: &str, field: &str) -> Result<(), ValidationError> {
        if !value.is_empty() && !value.chars().all(|c| c.is_ascii_digit()) {
            Err(ValidationError::with_value(
                field,
                "must contain only digits",
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates that a string looks like an http(s) URL
    pub fn http_url(value: &str, field: &str) -> Result<(), ValidationError> {
        let rest = value
            .strip_prefix("http://")
            .or_else(|| value.strip_prefix("https://"));
        match rest {
            Some(host) if !host.is_empty() => Ok(()),
            _ => Err(ValidationError::with_value(
                field,
                "must be an http:// or https:// URL",
                value,
            )),
        }
    }

    /// Collects multiple validation results into a single result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
