//! # Sale Policy
//!
//! The tunable limits the aggregator enforces. Values come from the host
//! application's configuration (see `atlas-sales`); this module only knows
//! their shape and defaults.
//!
//! ```toml
//! [policy]
//! max_items = 100
//! max_item_quantity = 999
//! max_payments = 20
//! min_payment_cents = 1
//! allow_adjustment_only = true
//! require_customer_for_credit = true
//! max_text_len = 500
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_MAX_TEXT_LEN, MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_PAYMENTS, MAX_SALE_ITEMS,
    MIN_PAYMENT_CENTS,
};

/// Limits applied by [`crate::aggregator::SaleAggregator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePolicy {
    /// Maximum line items per sale.
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Maximum quantity on a single line.
    #[serde(default = "default_max_item_quantity")]
    pub max_item_quantity: i64,

    /// Maximum payments per sale (split tender).
    #[serde(default = "default_max_payments")]
    pub max_payments: usize,

    /// Every payment must exceed this many cents.
    #[serde(default = "default_min_payment_cents")]
    pub min_payment_cents: i64,

    /// Accept a sale with no items when it carries cashback or a service
    /// charge.
    #[serde(default = "default_true")]
    pub allow_adjustment_only: bool,

    /// A CREDIT payment needs a customer name or phone to bill later.
    #[serde(default = "default_true")]
    pub require_customer_for_credit: bool,

    /// Maximum length of free-text fields (notes, references, names).
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
}

fn default_max_items() -> usize {
    MAX_SALE_ITEMS
}

fn default_max_item_quantity() -> i64 {
    MAX_ITEM_QUANTITY
}

fn default_max_payments() -> usize {
    MAX_PAYMENTS
}

fn default_min_payment_cents() -> i64 {
    MIN_PAYMENT_CENTS
}

fn default_true() -> bool {
    true
}

fn default_max_text_len() -> usize {
    DEFAULT_MAX_TEXT_LEN
}

impl Default for SalePolicy {
    fn default() -> Self {
        SalePolicy {
            max_items: default_max_items(),
            max_item_quantity: default_max_item_quantity(),
            max_payments: default_max_payments(),
            min_payment_cents: default_min_payment_cents(),
            allow_adjustment_only: true,
            require_customer_for_credit: true,
            max_text_len: default_max_text_len(),
        }
    }
}

impl SalePolicy {
    /// Checks the policy itself is usable. Returns a description of the first
    /// problem found.
    pub fn check(&self) -> Result<(), String> {
        if self.max_items == 0 {
            return Err("max_items must be greater than 0".into());
        }
        if self.max_payments == 0 {
            return Err("max_payments must be greater than 0".into());
        }
        if self.max_item_quantity < 1 {
            return Err("max_item_quantity must be at least 1".into());
        }
        if self.min_payment_cents < 0 {
            return Err("min_payment_cents must not be negative".into());
        }
        if self.max_text_len == 0 {
            return Err("max_text_len must be greater than 0".into());
        }
        if self.worst_case_amount_due().is_none() {
            return Err(
                "max_items × max_item_quantity allows a subtotal beyond the supported range".into(),
            );
        }
        if self.worst_case_total_paid().is_none() {
            return Err("max_payments allows a payment total beyond the supported range".into());
        }
        Ok(())
    }

    /// Every line at the quantity cap and the largest price, plus the largest
    /// cashback and service charge. `None` if that leaves i64.
    fn worst_case_amount_due(&self) -> Option<i64> {
        i64::try_from(self.max_items)
            .ok()?
            .checked_mul(self.max_item_quantity)?
            .checked_mul(MAX_AMOUNT_CENTS)?
            .checked_add(2 * MAX_AMOUNT_CENTS)
    }

    fn worst_case_total_paid(&self) -> Option<i64> {
        i64::try_from(self.max_payments)
            .ok()?
            .checked_mul(MAX_AMOUNT_CENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = SalePolicy::default();
        assert_eq!(policy.max_items, 100);
        assert_eq!(policy.max_item_quantity, 999);
        assert_eq!(policy.min_payment_cents, 1);
        assert!(policy.allow_adjustment_only);
        assert!(policy.check().is_ok());
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let policy: SalePolicy = serde_json::from_str(r#"{"max_items": 5}"#).unwrap();
        assert_eq!(policy.max_items, 5);
        assert_eq!(policy.max_payments, 20);
        assert!(policy.require_customer_for_credit);
    }

    #[test]
    fn test_check_rejects_negative_minimum() {
        let policy = SalePolicy {
            min_payment_cents: -1,
            ..SalePolicy::default()
        };
        assert!(policy.check().is_err());

        let zero = SalePolicy {
            min_payment_cents: 0,
            ..SalePolicy::default()
        };
        assert!(zero.check().is_ok());
    }

    #[test]
    fn test_check_rejects_limits_that_overflow_totals() {
        let quantity = SalePolicy {
            max_item_quantity: 100_000_000,
            ..SalePolicy::default()
        };
        assert!(quantity.check().unwrap_err().contains("max_item_quantity"));

        let payments = SalePolicy {
            max_payments: 10_000_000,
            ..SalePolicy::default()
        };
        assert!(payments.check().unwrap_err().contains("max_payments"));

        // 9_000 lines of 999 at the largest price still fits
        let wide = SalePolicy {
            max_items: 9_000,
            ..SalePolicy::default()
        };
        assert!(wide.check().is_ok());
    }
}
