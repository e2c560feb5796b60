//! # Validation Module
//!
//! Field-level validation for loosely typed request payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 One field: coerce, then ordered rules                   │
//! │                                                                         │
//! │  raw JSON value ("2", 2, null, "  ")                                    │
//! │        │                                                                │
//! │        ├── absent / null / blank? ──► Required (or None if optional)    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  coerce_*  ("2" ──► 2_i64, "10.50" ──► Money(1050), "CASH" ──► enum)    │
//! │        │                                                                │
//! │        ├── wrong shape ──► InvalidFormat / NotAllowed                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  rules[0], rules[1], ...   every failure is recorded, none short-cuts   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Validator collects ALL FieldErrors of the request, then finish()       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use atlas_core::validation::{coerce_integer, validate_quantity, Validator};
//! use serde_json::json;
//!
//! let mut v = Validator::new();
//! let qty = v.required("items[0].quantity", Some(&json!("3")), coerce_integer, &[
//!     &|field: &str, q: &i64| validate_quantity(field, *q, 999),
//! ]);
//! assert_eq!(qty, Some(3));
//! assert!(v.finish().is_ok());
//! ```

use serde_json::Value;

use crate::error::{ValidationError, ValidationErrors};
use crate::money::{Money, MoneyParseError};
use crate::types::ClosedSet;
use crate::MAX_AMOUNT_CENTS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Turns a present, non-blank raw value into a typed one.
pub type Coerce<T> = fn(&str, &Value) -> ValidationResult<T>;

/// A check on an already coerced value. Receives the field path.
pub type Rule<'a, T> = &'a dyn Fn(&str, &T) -> ValidationResult<()>;

// =============================================================================
// Validator (the runner)
// =============================================================================

/// Collects violations across every field of a request.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a field that must be present.
    ///
    /// Returns the coerced value when it passed every rule. A `None` return
    /// always means at least one violation was recorded.
    pub fn required<T>(
        &mut self,
        field: &str,
        raw: Option<&Value>,
        coerce: Coerce<T>,
        rules: &[Rule<'_, T>],
    ) -> Option<T> {
        match raw.filter(|v| !is_blank(v)) {
            Some(value) => self.run(field, value, coerce, rules),
            None => {
                self.report(ValidationError::Required {
                    field: field.to_string(),
                });
                None
            }
        }
    }

    /// Validates a field that may be absent, null or blank.
    ///
    /// Returns `None` both when the field is absent and when it is invalid;
    /// in the latter case a violation was recorded.
    pub fn optional<T>(
        &mut self,
        field: &str,
        raw: Option<&Value>,
        coerce: Coerce<T>,
        rules: &[Rule<'_, T>],
    ) -> Option<T> {
        raw.filter(|v| !is_blank(v))
            .and_then(|value| self.run(field, value, coerce, rules))
    }

    fn run<T>(
        &mut self,
        field: &str,
        value: &Value,
        coerce: Coerce<T>,
        rules: &[Rule<'_, T>],
    ) -> Option<T> {
        let typed = match coerce(field, value) {
            Ok(typed) => typed,
            Err(err) => {
                self.report(err);
                return None;
            }
        };

        let before = self.errors.len();
        for rule in rules {
            if let Err(err) = rule(field, &typed) {
                self.report(err);
            }
        }

        (self.errors.len() == before).then_some(typed)
    }

    /// Records the outcome of a cross-field rule.
    pub fn check(&mut self, outcome: ValidationResult<()>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(err) => {
                self.report(err);
                false
            }
        }
    }

    pub fn report(&mut self, err: ValidationError) {
        self.errors.push(err);
    }

    /// `Ok(())` when nothing was recorded.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Null and whitespace-only strings count as "not supplied".
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// =============================================================================
// Coercers
// =============================================================================

/// Accepts strings (trimmed) and numbers (rendered) as text.
pub fn coerce_text(field: &str, value: &Value) -> ValidationResult<String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a string".to_string(),
        }),
    }
}

/// Accepts JSON numbers and decimal strings; never goes through `f64`
/// arithmetic.
pub fn coerce_money(field: &str, value: &Value) -> ValidationResult<Money> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "must be a number".to_string(),
            })
        }
    };

    text.parse::<Money>().map_err(|err| match err {
        MoneyParseError::Empty => ValidationError::Required {
            field: field.to_string(),
        },
        MoneyParseError::InvalidFormat(_) => ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a decimal number".to_string(),
        },
        MoneyParseError::TooPrecise(_) => ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must have at most 2 decimal places".to_string(),
        },
        MoneyParseError::OutOfRange(_) => ValidationError::OutOfRange {
            field: field.to_string(),
            min: -(MAX_AMOUNT_CENTS / 100),
            max: MAX_AMOUNT_CENTS / 100,
        },
    })
}

/// Accepts integer numbers, integral floats (`2.0`) and integer strings.
pub fn coerce_integer(field: &str, value: &Value) -> ValidationResult<i64> {
    let not_whole = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a whole number".to_string(),
    };
    let too_large = || ValidationError::OutOfRange {
        field: field.to_string(),
        min: i64::MIN,
        max: i64::MAX,
    };

    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if n.is_u64() {
                Err(too_large())
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
                    Some(f) if f.fract() == 0.0 => Err(too_large()),
                    _ => Err(not_whole()),
                }
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| not_whole()),
        _ => Err(not_whole()),
    }
}

/// Resolves a member of a closed set.
///
/// Codes are matched exactly after trimming surrounding whitespace, so
/// `"cash"` is not `CASH`. Anything else, including non-string values, is a
/// schema violation and is never replaced by a default.
pub fn coerce_enum<E: ClosedSet>(field: &str, value: &Value) -> ValidationResult<E> {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    E::from_code(raw.trim()).ok_or_else(|| ValidationError::NotAllowed {
        field: field.to_string(),
        value: raw,
        allowed: E::codes(),
    })
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates free text length (counted in characters, not bytes).
pub fn validate_text_len(field: &str, text: &str, max: usize) -> ValidationResult<()> {
    if text.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates a customer phone number.
///
/// ## Rules
/// - Optional leading `+`
/// - Digits, spaces and hyphens only
/// - 7 to 20 characters in total
pub fn validate_phone(field: &str, phone: &str) -> ValidationResult<()> {
    let len = phone.chars().count();
    if !(7..=20).contains(&len) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be 7 to 20 characters".to_string(),
        });
    }

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only digits, spaces, hyphens and a leading +".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `max`
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  items[i].quantity = "5"                                                │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  coerce_integer ──► 5                                                   │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity ← THIS FUNCTION                                      │
/// │       ├── qty <= 0?  → "items[i].quantity must be positive"             │
/// │       ├── qty > max? → "items[i].quantity must be between 1 and max"    │
/// │       └── OK                                                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(field: &str, qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates a non-negative amount (unit price, cashback, service charge).
///
/// ## Example
/// ```rust
/// use atlas_core::money::Money;
/// use atlas_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("unitPrice", &Money::from_cents(1099)).is_ok());
/// assert!(validate_non_negative("unitPrice", &Money::zero()).is_ok());
/// assert!(validate_non_negative("unitPrice", &Money::from_cents(-100)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: &Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS / 100,
        });
    }

    Ok(())
}

/// Validates a payment amount.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must be strictly greater than `min_cents`
///
/// ## Example
/// ```rust
/// use atlas_core::money::Money;
/// use atlas_core::validation::validate_payment_amount;
///
/// assert!(validate_payment_amount("amount", &Money::from_cents(2), 1).is_ok());
/// assert!(validate_payment_amount("amount", &Money::from_cents(1), 1).is_err());
/// ```
pub fn validate_payment_amount(field: &str, amount: &Money, min_cents: i64) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if amount.cents() <= min_cents {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must be greater than {}", Money::from_cents(min_cents)),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that a list holds at most `max` entries.
pub fn validate_collection_size(field: &str, len: usize, max: usize) -> ValidationResult<()> {
    if len > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: max as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;
    use serde_json::json;

    #[test]
    fn test_required_reports_missing_null_and_blank() {
        let mut v = Validator::new();
        assert_eq!(v.required("a", None, coerce_text, &[]), None);
        assert_eq!(v.required("b", Some(&Value::Null), coerce_text, &[]), None);
        assert_eq!(v.required("c", Some(&json!("   ")), coerce_text, &[]), None);

        let errors = v.finish().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.rule() == "required"));
    }

    #[test]
    fn test_optional_absent_is_not_an_error() {
        let mut v = Validator::new();
        assert_eq!(v.optional("notes", None, coerce_text, &[]), None);
        assert_eq!(v.optional("notes", Some(&json!("")), coerce_text, &[]), None);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_runner_records_every_failing_rule() {
        let fail_a: Rule<'_, i64> = &|f, _| {
            Err(ValidationError::Conflict {
                field: f.to_string(),
                reason: "a".to_string(),
            })
        };
        let fail_b: Rule<'_, i64> = &|f, _| {
            Err(ValidationError::Conflict {
                field: f.to_string(),
                reason: "b".to_string(),
            })
        };

        let mut v = Validator::new();
        assert_eq!(v.required("x", Some(&json!(1)), coerce_integer, &[fail_a, fail_b]), None);
        assert_eq!(v.finish().unwrap_err().len(), 2);
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce_integer("q", &json!(3)), Ok(3));
        assert_eq!(coerce_integer("q", &json!("3")), Ok(3));
        assert_eq!(coerce_integer("q", &json!(" 4 ")), Ok(4));
        assert_eq!(coerce_integer("q", &json!(2.0)), Ok(2));
        assert_eq!(coerce_integer("q", &json!(-1)), Ok(-1));
        assert!(coerce_integer("q", &json!(2.5)).is_err());
        assert!(coerce_integer("q", &json!("2.5")).is_err());
        assert!(coerce_integer("q", &json!(true)).is_err());
        assert!(coerce_integer("q", &json!(u64::MAX)).is_err());
    }

    #[test]
    fn test_coerce_money() {
        assert_eq!(coerce_money("p", &json!(13.5)).unwrap().cents(), 1350);
        assert_eq!(coerce_money("p", &json!("13.50")).unwrap().cents(), 1350);
        assert_eq!(coerce_money("p", &json!(0)).unwrap().cents(), 0);
        assert_eq!(coerce_money("p", &json!(0.1)).unwrap().cents(), 10);

        let err = coerce_money("p", &json!("1.234")).unwrap_err();
        assert_eq!(err.rule(), "invalid_format");
        assert!(coerce_money("p", &json!([])).is_err());
        assert!(coerce_money("p", &json!("ten")).is_err());
    }

    #[test]
    fn test_coerce_enum_never_defaults() {
        assert_eq!(
            coerce_enum::<PaymentMethod>("m", &json!("CASH")),
            Ok(PaymentMethod::Cash)
        );
        assert_eq!(
            coerce_enum::<PaymentMethod>("m", &json!(" CARD ")),
            Ok(PaymentMethod::Card)
        );

        for near_miss in ["card", "Card", "cArD"] {
            let err = coerce_enum::<PaymentMethod>("m", &json!(near_miss)).unwrap_err();
            assert!(err.is_schema_violation(), "{} was accepted", near_miss);
        }
        let err = coerce_enum::<PaymentMethod>("m", &json!("CHEQUE")).unwrap_err();
        assert!(err.is_schema_violation());
        let err = coerce_enum::<PaymentMethod>("m", &json!(7)).unwrap_err();
        assert!(err.is_schema_violation());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("q", 1, 999).is_ok());
        assert!(validate_quantity("q", 999, 999).is_ok());
        assert!(validate_quantity("q", 0, 999).is_err());
        assert!(validate_quantity("q", -1, 999).is_err());
        assert!(validate_quantity("q", 1000, 999).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount("a", &Money::from_cents(2), 1).is_ok());
        assert!(validate_payment_amount("a", &Money::from_cents(1), 0).is_ok());
        let err = validate_payment_amount("a", &Money::from_cents(1), 1).unwrap_err();
        assert_eq!(err.to_string(), "a has invalid format: must be greater than 0.01");
        assert!(matches!(
            validate_payment_amount("a", &Money::zero(), 1),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_payment_amount("a", &Money::from_cents(-5), 1).is_err());
        assert!(validate_payment_amount("a", &Money::from_cents(100), 100).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("p", "+254 700 000000").is_ok());
        assert!(validate_phone("p", "0300-1234567").is_ok());
        assert!(validate_phone("p", "12345").is_err());
        assert!(validate_phone("p", "call me maybe").is_err());
    }

    #[test]
    fn test_validate_text_len_counts_chars() {
        assert!(validate_text_len("n", "ééé", 3).is_ok());
        assert!(validate_text_len("n", "éééé", 3).is_err());
    }
}
