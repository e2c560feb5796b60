//! # Error Types
//!
//! Domain-specific error types for atlas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atlas-core errors (this file)                                         │
//! │  ├── ValidationError   - What is wrong with ONE field                   │
//! │  ├── FieldError        - ValidationError + where (payments[1].amount)   │
//! │  ├── ValidationErrors  - Every FieldError found in one request          │
//! │  ├── SchemaError       - Enumerated value outside its closed set        │
//! │  └── SaleError         - What validate_and_build returns                │
//! │                                                                         │
//! │  atlas-sales errors (separate crate)                                   │
//! │  ├── ConfigError       - sales.toml / environment problems              │
//! │  └── ApiError          - What the HTTP layer sees (serialized)          │
//! │                                                                         │
//! │  Flow: ValidationError → FieldError → SaleError → ApiError → 4xx        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field path, limits, allowed values)
//! 3. Errors are enum variants, never String
//! 4. Collect, don't fail fast: a request reports every violation at once

use serde::Serialize;
use std::fmt;
use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// A single rule violation on a single field.
///
/// The `field` carried by each variant is the full path of the offending
/// value, e.g. `items[0].quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (not a number, too many decimals, wrong type).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Value contradicts another field of the same request.
    #[error("{field} {reason}")]
    Conflict { field: String, reason: String },
}

impl ValidationError {
    /// Path of the field this violation is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Conflict { field, .. } => field,
        }
    }

    /// Short machine-readable rule name, used in API error details.
    pub fn rule(&self) -> &'static str {
        match self {
            ValidationError::Required { .. } => "required",
            ValidationError::TooLong { .. } => "too_long",
            ValidationError::OutOfRange { .. } => "out_of_range",
            ValidationError::MustBePositive { .. } => "must_be_positive",
            ValidationError::InvalidFormat { .. } => "invalid_format",
            ValidationError::NotAllowed { .. } => "not_allowed",
            ValidationError::Conflict { .. } => "conflict",
        }
    }

    /// True for violations of a closed enumeration.
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, ValidationError::NotAllowed { .. })
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// Serializable view of one violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub rule: &'static str,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        FieldError {
            field: err.field().to_string(),
            rule: err.rule(),
            message: err.to_string(),
        }
    }
}

/// Every violation found while validating one request, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// True if any violation is about `field` or one of its children
    /// (`payments[1]` matches `payments[1].amount`).
    pub fn touches(&self, field: &str) -> bool {
        self.0.iter().any(|e| {
            let path = e.field();
            path == field
                || path
                    .strip_prefix(field)
                    .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
        })
    }

    pub fn field_errors(&self) -> Vec<FieldError> {
        self.0.iter().map(FieldError::from).collect()
    }

    /// Splits off the enumeration violations.
    fn partition_schema(self) -> (Vec<ValidationError>, Vec<ValidationError>) {
        self.0.into_iter().partition(|e| e.is_schema_violation())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors(vec![err])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// =============================================================================
// Schema Error
// =============================================================================

/// One or more enumerated fields held a value outside their closed set.
///
/// Other violations found in the same pass travel along in `also` so the
/// caller can still report everything at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe_schema(.violations))]
pub struct SchemaError {
    pub violations: Vec<ValidationError>,
    pub also: ValidationErrors,
}

fn describe_schema(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(|v| match v {
            ValidationError::NotAllowed { field, value, .. } => {
                format!("unknown value '{}' for {}", value, field)
            }
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Sale Error
// =============================================================================

/// Rejection produced by the sale aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    /// One or more field-level violations.
    #[error("Sale failed validation: {0}")]
    Validation(ValidationErrors),

    /// An enumerated field was not a member of its set.
    #[error("Sale has invalid enumerated values: {0}")]
    Schema(SchemaError),
}

impl SaleError {
    /// Classifies a non-empty set of collected violations.
    ///
    /// Any enumeration violation turns the whole rejection into
    /// [`SaleError::Schema`].
    pub fn from_collected(errors: ValidationErrors) -> Self {
        if !errors.iter().any(ValidationError::is_schema_violation) {
            return SaleError::Validation(errors);
        }
        let (violations, rest) = errors.partition_schema();
        SaleError::Schema(SchemaError {
            violations,
            also: ValidationErrors(rest),
        })
    }

    /// Every violation, schema ones first.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            SaleError::Validation(errors) => errors.field_errors(),
            SaleError::Schema(schema) => schema
                .violations
                .iter()
                .map(FieldError::from)
                .chain(schema.also.field_errors())
                .collect(),
        }
    }

    /// True if any violation concerns `field` or its children.
    pub fn touches(&self, field: &str) -> bool {
        self.field_errors().iter().any(|e| {
            e.field == field
                || e.field
                    .strip_prefix(field)
                    .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
        })
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, SaleError::Schema(_))
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with SaleError.
pub type CoreResult<T> = Result<T, SaleError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn not_allowed(field: &str, value: &str) -> ValidationError {
        ValidationError::NotAllowed {
            field: field.to_string(),
            value: value.to_string(),
            allowed: vec!["CASH".to_string(), "CARD".to_string()],
        }
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "items[0].productId".to_string(),
        };
        assert_eq!(err.to_string(), "items[0].productId is required");

        let err = ValidationError::OutOfRange {
            field: "items[1].quantity".to_string(),
            min: 1,
            max: 999,
        };
        assert_eq!(err.to_string(), "items[1].quantity must be between 1 and 999");
        assert_eq!(err.rule(), "out_of_range");
    }

    #[test]
    fn test_touches_matches_children_only() {
        let errors: ValidationErrors = ValidationError::MustBePositive {
            field: "payments[1].amount".to_string(),
        }
        .into();

        assert!(errors.touches("payments[1]"));
        assert!(errors.touches("payments[1].amount"));
        assert!(errors.touches("payments"));
        assert!(!errors.touches("payments[10]"));
        assert!(!errors.touches("payments[0]"));
    }

    #[test]
    fn test_from_collected_without_enums_is_validation() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::Required {
            field: "payments".to_string(),
        });

        let err = SaleError::from_collected(errors);
        assert!(matches!(err, SaleError::Validation(ref e) if e.len() == 1));
    }

    #[test]
    fn test_from_collected_with_enum_is_schema_and_keeps_the_rest() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::MustBePositive {
            field: "payments[0].amount".to_string(),
        });
        errors.push(not_allowed("payments[1].method", "BITCOIN"));

        let err = SaleError::from_collected(errors);
        match &err {
            SaleError::Schema(schema) => {
                assert_eq!(schema.violations.len(), 1);
                assert_eq!(schema.also.len(), 1);
                assert_eq!(
                    schema.to_string(),
                    "unknown value 'BITCOIN' for payments[1].method"
                );
            }
            other => panic!("expected schema error, got {:?}", other),
        }

        let details = err.field_errors();
        assert_eq!(details[0].rule, "not_allowed");
        assert_eq!(details[1].field, "payments[0].amount");
    }
}
