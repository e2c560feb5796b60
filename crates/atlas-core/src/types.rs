//! # Domain Types
//!
//! Core domain types produced by the sale aggregator.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    SaleItem     │   │      Sale       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │◄──│  items[]        │──►│  method         │       │
//! │  │  variant_id?    │   │  payments[]     │   │  amount_cents   │       │
//! │  │  quantity       │   │  cashback?      │   │  reference?     │       │
//! │  │  unit_price     │   │  service_charge?│   │  notes?         │       │
//! │  └─────────────────┘   │  customer?      │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ PaymentMethod   │   │ TransactionType │   │  CreditStatus   │       │
//! │  │  CASH  CARD     │   │  STANDARD       │   │  Settled        │       │
//! │  │  CREDIT MOBILE  │   │  CASHBACK       │   │  OnCredit       │       │
//! │  └─────────────────┘   │  SERVICE        │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Immutability
//! A [`Sale`] can only be produced by the aggregator and exposes no mutators.
//! Whoever receives one (persistence, inventory adjustment) gets exactly what
//! was validated.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Closed Sets
// =============================================================================

/// An enumeration whose wire values form a closed set of string codes.
///
/// The codes are owned here, not by any persistence layer's generated types.
pub trait ClosedSet: Sized + Copy + 'static {
    /// Every member, in declaration order.
    const ALL: &'static [Self];

    /// The wire code (`"CASH"`).
    fn code(&self) -> &'static str;

    /// Looks up a member by its exact wire code.
    fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.code() == code)
    }

    /// All wire codes, for error messages.
    fn codes() -> Vec<String> {
        Self::ALL.iter().map(|m| m.code().to_string()).collect()
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Amount put on the customer's account, settled later.
    Credit,
    /// Mobile money / wallet transfer.
    Mobile,
}

impl ClosedSet for PaymentMethod {
    const ALL: &'static [Self] = &[
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Credit,
        PaymentMethod::Mobile,
    ];

    fn code(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Credit => "CREDIT",
            PaymentMethod::Mobile => "MOBILE",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Transaction Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Goods sold, nothing else.
    #[default]
    Standard,
    /// Customer also takes cash out of the drawer.
    Cashback,
    /// A service fee is charged on top of (or instead of) goods.
    Service,
}

impl ClosedSet for TransactionType {
    const ALL: &'static [Self] = &[
        TransactionType::Standard,
        TransactionType::Cashback,
        TransactionType::Service,
    ];

    fn code(&self) -> &'static str {
        match self {
            TransactionType::Standard => "STANDARD",
            TransactionType::Cashback => "CASHBACK",
            TransactionType::Service => "SERVICE",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// One priced line in a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
    /// Unit price in cents at time of sale.
    pub unit_price_cents: i64,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity, `None` if it does not fit in i64.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price().checked_mul_quantity(self.quantity)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards a sale.
/// A sale can have multiple payments for split tender scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: PaymentMethod,
    /// Amount paid in cents.
    pub amount_cents: i64,
    /// External reference (card auth code, mobile transaction id).
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Optional customer identification attached to a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl Customer {
    /// `None` unless at least one of name or phone is present.
    pub fn from_parts(name: Option<String>, phone: Option<String>) -> Option<Self> {
        if name.is_none() && phone.is_none() {
            None
        } else {
            Some(Customer { name, phone })
        }
    }
}

// =============================================================================
// Credit Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CreditStatus {
    /// Nothing was put on account.
    Settled,
    /// Part or all of the sale was paid with CREDIT.
    OnCredit {
        #[serde(rename = "outstandingCents")]
        outstanding_cents: i64,
    },
}

// =============================================================================
// Sale
// =============================================================================

/// A validated sale, ready for the persistence collaborator.
///
/// Built only by [`crate::aggregator::SaleAggregator`]; item and payment order
/// is exactly the order of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    items: Vec<SaleItem>,
    payments: Vec<Payment>,
    transaction_type: TransactionType,
    cashback_amount_cents: Option<i64>,
    service_charge_cents: Option<i64>,
    customer: Option<Customer>,
    notes: Option<String>,
    subtotal_cents: i64,
    total_paid_cents: i64,
}

/// Sums the aggregator has already computed with overflow checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SaleTotals {
    pub subtotal: Money,
    pub total_paid: Money,
}

impl Sale {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        items: Vec<SaleItem>,
        payments: Vec<Payment>,
        transaction_type: TransactionType,
        cashback: Option<Money>,
        service_charge: Option<Money>,
        customer: Option<Customer>,
        notes: Option<String>,
        SaleTotals {
            subtotal,
            total_paid,
        }: SaleTotals,
    ) -> Self {
        Sale {
            items,
            payments,
            transaction_type,
            cashback_amount_cents: cashback.map(|m| m.cents()),
            service_charge_cents: service_charge.map(|m| m.cents()),
            customer,
            notes,
            subtotal_cents: subtotal.cents(),
            total_paid_cents: total_paid.cents(),
        }
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Σ quantity × unit price.
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Σ payment amounts, all methods.
    pub fn total_paid(&self) -> Money {
        Money::from_cents(self.total_paid_cents)
    }

    /// Cashback handed out, zero when absent.
    pub fn cashback(&self) -> Money {
        Money::from_cents(self.cashback_amount_cents.unwrap_or(0))
    }

    /// Service charge, zero when absent.
    pub fn service_charge(&self) -> Money {
        Money::from_cents(self.service_charge_cents.unwrap_or(0))
    }

    /// What the payments have to cover: goods + service charge + cashback.
    pub fn amount_due(&self) -> Money {
        self.subtotal() + self.service_charge() + self.cashback()
    }

    /// Total paid minus amount due. Positive means overpaid.
    pub fn implied_discrepancy(&self) -> Money {
        self.total_paid() - self.amount_due()
    }

    /// Σ payments made with `method`.
    pub fn paid_with(&self, method: PaymentMethod) -> Money {
        self.payments
            .iter()
            .filter(|p| p.method == method)
            .map(Payment::amount)
            .sum()
    }

    /// A sale without items, carrying only cashback or a service charge.
    pub fn is_adjustment_only(&self) -> bool {
        self.items.is_empty()
    }

    pub fn credit_status(&self) -> CreditStatus {
        let on_account = self.paid_with(PaymentMethod::Credit);
        if on_account.is_positive() {
            CreditStatus::OnCredit {
                outstanding_cents: on_account.cents(),
            }
        } else {
            CreditStatus::Settled
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, unit_price_cents: i64) -> SaleItem {
        SaleItem {
            product_id: "p-1".to_string(),
            variant_id: None,
            quantity,
            unit_price_cents,
        }
    }

    fn payment(method: PaymentMethod, amount_cents: i64) -> Payment {
        Payment {
            method,
            amount_cents,
            reference: None,
            notes: None,
        }
    }

    #[test]
    fn test_closed_set_lookup_is_exact() {
        assert_eq!(PaymentMethod::from_code("CASH"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::from_code("MOBILE"), Some(PaymentMethod::Mobile));
        assert_eq!(PaymentMethod::from_code("cash"), None);
        assert_eq!(PaymentMethod::from_code("BITCOIN"), None);
        assert_eq!(
            TransactionType::codes(),
            vec!["STANDARD", "CASHBACK", "SERVICE"]
        );
    }

    #[test]
    fn test_transaction_type_default() {
        assert_eq!(TransactionType::default(), TransactionType::Standard);
    }

    #[test]
    fn test_serde_codes_match_closed_set() {
        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.code()));
        }
    }

    #[test]
    fn test_line_total_refuses_overflow() {
        assert_eq!(item(3, 250).line_total(), Some(Money::from_cents(750)));
        assert_eq!(item(100_000_000, crate::MAX_AMOUNT_CENTS).line_total(), None);
    }

    #[test]
    fn test_sale_money_accessors() {
        let sale = Sale::assemble(
            vec![item(2, 500), item(1, 350)],
            vec![
                payment(PaymentMethod::Cash, 1000),
                payment(PaymentMethod::Credit, 850),
            ],
            TransactionType::Cashback,
            Some(Money::from_cents(500)),
            None,
            None,
            None,
            SaleTotals {
                subtotal: Money::from_cents(1350),
                total_paid: Money::from_cents(1850),
            },
        );

        assert_eq!(sale.subtotal().cents(), 1350);
        assert_eq!(sale.amount_due().cents(), 1850);
        assert_eq!(sale.total_paid().cents(), 1850);
        assert!(sale.implied_discrepancy().is_zero());
        assert_eq!(sale.paid_with(PaymentMethod::Cash).cents(), 1000);
        assert_eq!(
            sale.credit_status(),
            CreditStatus::OnCredit {
                outstanding_cents: 850
            }
        );
    }

    #[test]
    fn test_sale_serializes_camel_case() {
        let sale = Sale::assemble(
            vec![item(1, 100)],
            vec![payment(PaymentMethod::Card, 100)],
            TransactionType::Standard,
            None,
            None,
            Customer::from_parts(Some("Ada".to_string()), None),
            None,
            SaleTotals {
                subtotal: Money::from_cents(100),
                total_paid: Money::from_cents(100),
            },
        );

        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["items"][0]["unitPriceCents"], 100);
        assert_eq!(json["payments"][0]["method"], "CARD");
        assert_eq!(json["transactionType"], "STANDARD");
        assert_eq!(json["customer"]["name"], "Ada");
        assert_eq!(json["subtotalCents"], 100);
    }

    #[test]
    fn test_customer_from_parts() {
        assert!(Customer::from_parts(None, None).is_none());
        assert!(Customer::from_parts(None, Some("0700".to_string())).is_some());
    }
}
