//! # API Error Type
//!
//! Unified error type returned by the intake service.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Atlas POS                              │
//! │                                                                         │
//! │  SaleIntake::submit(request)                                            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  SaleError::Validation ─────► VALIDATION_ERROR  (400) + field details   │
//! │  SaleError::Schema ─────────► SCHEMA_ERROR      (422) + field details   │
//! │  Reconciliation unsettled ──► PAYMENT_MISMATCH  (422)                   │
//! │                                                                         │
//! │  The HTTP layer serializes ApiError as the response body:              │
//! │  { "code": "VALIDATION_ERROR",                                          │
//! │    "message": "Sale failed validation: ...",                            │
//! │    "details": [{ "field": "payments[1].amount",                         │
//! │                  "rule": "must_be_positive",                            │
//! │                  "message": "payments[1].amount must be positive" }] }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use atlas_core::{FieldError, Reconciliation, SaleError, SettlementStatus};
use serde::Serialize;

/// API error returned from the intake service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// One entry per offending field; empty when not field-specific.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Enumerated value outside its set (422)
    SchemaError,

    /// Payments do not settle the amount due (422)
    PaymentMismatch,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::SchemaError => "SCHEMA_ERROR",
            ErrorCode::PaymentMismatch => "PAYMENT_MISMATCH",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = details;
        self
    }

    /// Rejection for a valid sale whose payments do not settle it.
    pub fn payment_mismatch(outcome: &Reconciliation) -> Self {
        let message = match outcome.status {
            SettlementStatus::Underpaid { shortfall_cents } => format!(
                "Payments fall short of the amount due by {}",
                atlas_core::Money::from_cents(shortfall_cents)
            ),
            SettlementStatus::Overpaid { excess_cents } => format!(
                "Payments exceed the amount due by {} and cannot be returned as change",
                atlas_core::Money::from_cents(excess_cents)
            ),
            SettlementStatus::Balanced | SettlementStatus::ChangeDue { .. } => {
                "Payments do not match the amount due".to_string()
            }
        };
        ApiError::new(ErrorCode::PaymentMismatch, message)
    }

    /// HTTP status the transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self.code {
            ErrorCode::ValidationError => 400,
            ErrorCode::SchemaError | ErrorCode::PaymentMismatch => 422,
        }
    }

    /// Number of offending fields.
    pub fn violation_count(&self) -> usize {
        self.details.len()
    }
}

/// Converts core errors to API errors.
impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        let code = if err.is_schema() {
            ErrorCode::SchemaError
        } else {
            ErrorCode::ValidationError
        };
        ApiError::new(code, err.to_string()).with_details(err.field_errors())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
