//! # Reconciliation
//!
//! Compares what a validated [`Sale`] asks for with what its payments cover.
//! The aggregator never does this on its own: whether a sale must balance to
//! the cent, within a tolerance, or may hand back change is a business rule
//! the caller passes in as a [`ReconciliationPolicy`].
//!
//! ## Arithmetic
//! ```text
//! amount_due  = subtotal + service_charge + cashback
//! total_paid  = Σ payments (every method, CREDIT included)
//! discrepancy = total_paid − amount_due        (> 0 means overpaid)
//!
//! |discrepancy| ≤ tolerance                          ──► Balanced
//! discrepancy > tolerance, cash change allowed,
//!     cash tendered ≥ discrepancy                    ──► ChangeDue
//! discrepancy > tolerance otherwise                  ──► Overpaid
//! discrepancy < −tolerance                           ──► Underpaid
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CreditStatus, PaymentMethod, Sale};

/// How strictly payments must match the amount due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPolicy {
    /// Largest absolute discrepancy still treated as balanced, in cents.
    #[serde(default)]
    pub tolerance_cents: i64,

    /// Overpayment may be returned as change when enough cash was tendered.
    #[serde(default = "default_allow_cash_change")]
    pub allow_cash_change: bool,
}

fn default_allow_cash_change() -> bool {
    true
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        ReconciliationPolicy {
            tolerance_cents: 0,
            allow_cash_change: default_allow_cash_change(),
        }
    }
}

impl ReconciliationPolicy {
    /// Exact match, no change.
    pub fn strict() -> Self {
        ReconciliationPolicy {
            tolerance_cents: 0,
            allow_cash_change: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SettlementStatus {
    Balanced,
    ChangeDue {
        #[serde(rename = "changeCents")]
        change_cents: i64,
    },
    Overpaid {
        #[serde(rename = "excessCents")]
        excess_cents: i64,
    },
    Underpaid {
        #[serde(rename = "shortfallCents")]
        shortfall_cents: i64,
    },
}

/// Outcome of reconciling one sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub subtotal_cents: i64,
    pub amount_due_cents: i64,
    pub total_paid_cents: i64,
    pub discrepancy_cents: i64,
    pub status: SettlementStatus,
    pub credit: CreditStatus,
}

impl Reconciliation {
    /// Balanced, or overpaid in cash that goes back as change.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.status,
            SettlementStatus::Balanced | SettlementStatus::ChangeDue { .. }
        )
    }

    pub fn discrepancy(&self) -> Money {
        Money::from_cents(self.discrepancy_cents)
    }

    pub fn change_due(&self) -> Money {
        match self.status {
            SettlementStatus::ChangeDue { change_cents } => Money::from_cents(change_cents),
            _ => Money::zero(),
        }
    }
}

/// Reconciles `sale` under `policy`. Pure.
///
/// ## Example
/// ```rust
/// use atlas_core::aggregator::SaleAggregator;
/// use atlas_core::reconciliation::{reconcile, ReconciliationPolicy};
/// use serde_json::json;
///
/// let sale = SaleAggregator::default()
///     .build_from_request(&json!({
///         "items": [{"productId": "p-1", "quantity": 1, "unitPrice": "7.50"}],
///         "payments": [{"method": "CASH", "amount": "10"}]
///     }))
///     .unwrap();
///
/// let outcome = reconcile(&sale, &ReconciliationPolicy::default());
/// assert!(outcome.is_settled());
/// assert_eq!(outcome.change_due().cents(), 250);
/// ```
pub fn reconcile(sale: &Sale, policy: &ReconciliationPolicy) -> Reconciliation {
    let discrepancy = sale.implied_discrepancy();
    let tolerance = policy.tolerance_cents.max(0);
    let cash = sale.paid_with(PaymentMethod::Cash);

    let status = if discrepancy.abs().cents() <= tolerance {
        SettlementStatus::Balanced
    } else if discrepancy.is_positive() {
        if policy.allow_cash_change && cash >= discrepancy {
            SettlementStatus::ChangeDue {
                change_cents: discrepancy.cents(),
            }
        } else {
            SettlementStatus::Overpaid {
                excess_cents: discrepancy.cents(),
            }
        }
    } else {
        SettlementStatus::Underpaid {
            shortfall_cents: discrepancy.abs().cents(),
        }
    };

    Reconciliation {
        subtotal_cents: sale.subtotal().cents(),
        amount_due_cents: sale.amount_due().cents(),
        total_paid_cents: sale.total_paid().cents(),
        discrepancy_cents: discrepancy.cents(),
        status,
        credit: sale.credit_status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::SaleAggregator;
    use serde_json::{json, Value};

    fn sale(request: Value) -> Sale {
        SaleAggregator::default().build_from_request(&request).unwrap()
    }

    fn one_item_sale(price: &str, payments: Value) -> Sale {
        sale(json!({
            "items": [{"productId": "p-1", "quantity": 1, "unitPrice": price}],
            "payments": payments,
            "customerName": "Ada"
        }))
    }

    #[test]
    fn test_exact_payment_is_balanced() {
        let s = one_item_sale("10.00", json!([{"method": "CASH", "amount": "10.00"}]));
        let r = reconcile(&s, &ReconciliationPolicy::strict());
        assert_eq!(r.status, SettlementStatus::Balanced);
        assert!(r.discrepancy().is_zero());
        assert!(r.is_settled());
    }

    #[test]
    fn test_tolerance_absorbs_rounding() {
        let s = one_item_sale("9.99", json!([{"method": "CARD", "amount": "10.00"}]));

        let strict = reconcile(&s, &ReconciliationPolicy::strict());
        assert_eq!(strict.status, SettlementStatus::Overpaid { excess_cents: 1 });
        assert!(!strict.is_settled());

        let lenient = ReconciliationPolicy {
            tolerance_cents: 2,
            allow_cash_change: false,
        };
        assert_eq!(reconcile(&s, &lenient).status, SettlementStatus::Balanced);
    }

    #[test]
    fn test_change_needs_enough_cash() {
        let s = one_item_sale(
            "10.00",
            json!([
                {"method": "CARD", "amount": "8.00"},
                {"method": "CASH", "amount": "5.00"}
            ]),
        );
        let r = reconcile(&s, &ReconciliationPolicy::default());
        assert_eq!(r.status, SettlementStatus::ChangeDue { change_cents: 300 });
        assert_eq!(r.change_due().cents(), 300);

        let card_only = one_item_sale("10.00", json!([{"method": "CARD", "amount": "13.00"}]));
        let r = reconcile(&card_only, &ReconciliationPolicy::default());
        assert_eq!(r.status, SettlementStatus::Overpaid { excess_cents: 300 });
    }

    #[test]
    fn test_underpaid() {
        let s = one_item_sale("10.00", json!([{"method": "CASH", "amount": "4.00"}]));
        let r = reconcile(&s, &ReconciliationPolicy::default());
        assert_eq!(r.status, SettlementStatus::Underpaid { shortfall_cents: 600 });
        assert!(!r.is_settled());
    }

    #[test]
    fn test_cashback_and_service_charge_raise_amount_due() {
        let s = sale(json!({
            "items": [{"productId": "p-1", "quantity": 2, "unitPrice": "5.00"}],
            "payments": [{"method": "CARD", "amount": "32.50"}],
            "transactionType": "CASHBACK",
            "cashbackAmount": "20",
            "serviceCharge": "2.50"
        }));
        let r = reconcile(&s, &ReconciliationPolicy::strict());
        assert_eq!(r.subtotal_cents, 1000);
        assert_eq!(r.amount_due_cents, 3250);
        assert_eq!(r.status, SettlementStatus::Balanced);
    }

    #[test]
    fn test_credit_counts_toward_payment() {
        let s = one_item_sale(
            "10.00",
            json!([
                {"method": "CASH", "amount": "4.00"},
                {"method": "CREDIT", "amount": "6.00"}
            ]),
        );
        let r = reconcile(&s, &ReconciliationPolicy::strict());
        assert!(r.is_settled());
        assert_eq!(
            r.credit,
            CreditStatus::OnCredit {
                outstanding_cents: 600
            }
        );
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: ReconciliationPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, ReconciliationPolicy::default());
        assert!(policy.allow_cash_change);
    }
}
