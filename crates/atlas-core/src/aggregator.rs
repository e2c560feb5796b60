//! # Sale Aggregator
//!
//! Turns the loosely typed fields of an incoming sale request into a
//! validated [`Sale`], or a structured rejection listing every problem.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      validate_and_build()                               │
//! │                                                                         │
//! │  items[]      ──► per item:    productId, variantId?, quantity, price   │
//! │  payments[]   ──► per payment: method, amount, reference?, notes?       │
//! │  adjustments  ──► transactionType, cashbackAmount?, serviceCharge?,     │
//! │                   customerName?, customerPhone?, notes?                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  cross-field rules                                                      │
//! │    • payments non-empty, item/payment counts within policy              │
//! │    • zero items only for adjustment-only sales                          │
//! │    • CASHBACK needs cashback, SERVICE needs a service charge            │
//! │    • CREDIT needs an identified customer                                │
//! │        │                                                                │
//! │        ├── any NotAllowed ──► SaleError::Schema                         │
//! │        ├── other errors   ──► SaleError::Validation                     │
//! │        └── clean          ──► Sale (order preserved, immutable)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The aggregator performs no I/O and owns nothing but its policy, so a
//! single instance can be shared across threads.

use serde_json::{Map, Value};

use crate::error::{CoreResult, SaleError, ValidationError};
use crate::money::Money;
use crate::policy::SalePolicy;
use crate::types::{
    Customer, Payment, PaymentMethod, Sale, SaleItem, SaleTotals, TransactionType,
};
use crate::validation::{
    coerce_enum, coerce_integer, coerce_money, coerce_text, is_blank, validate_collection_size,
    validate_non_negative, validate_payment_amount, validate_phone,
    validate_quantity, validate_text_len, Rule, Validator,
};

/// Sum of quantity × unit price over `items`. Empty input is zero; `None`
/// when the total does not fit in i64.
///
/// ## Example
/// ```rust
/// use atlas_core::aggregator::compute_subtotal;
/// use atlas_core::money::Money;
/// use atlas_core::types::SaleItem;
///
/// let line = |quantity, unit_price_cents| SaleItem {
///     product_id: "p".to_string(),
///     variant_id: None,
///     quantity,
///     unit_price_cents,
/// };
///
/// assert_eq!(compute_subtotal(&[]), Some(Money::zero()));
/// assert_eq!(compute_subtotal(&[line(2, 500), line(1, 350)]), Some(Money::from_cents(1350)));
/// assert_eq!(compute_subtotal(&[line(i64::MAX, 2)]), None);
/// ```
pub fn compute_subtotal(items: &[SaleItem]) -> Option<Money> {
    items
        .iter()
        .try_fold(Money::zero(), |total, item| total.checked_add(item.line_total()?))
}

/// Validates and assembles sales under a fixed [`SalePolicy`].
#[derive(Debug, Clone, Default)]
pub struct SaleAggregator {
    policy: SalePolicy,
}

impl SaleAggregator {
    pub fn new(policy: SalePolicy) -> Self {
        SaleAggregator { policy }
    }

    pub fn policy(&self) -> &SalePolicy {
        &self.policy
    }

    /// Validates the three parts of a sale request and builds the [`Sale`].
    ///
    /// Item and payment order is kept. Every violation is collected before
    /// returning; an unknown enumerated value makes the error a
    /// [`SaleError::Schema`].
    pub fn validate_and_build(
        &self,
        raw_items: &[Value],
        raw_payments: &[Value],
        raw_adjustments: &Map<String, Value>,
    ) -> CoreResult<Sale> {
        self.build(
            Validator::new(),
            Some(raw_items),
            Some(raw_payments),
            raw_adjustments,
        )
    }

    /// Builds a sale from a whole request record:
    /// `{ "items": [...], "payments": [...], "transactionType": ..., ... }`.
    ///
    /// A missing `items` key is an empty list. A non-array `items` or
    /// `payments` is reported on that key.
    pub fn build_from_request(&self, request: &Value) -> CoreResult<Sale> {
        let Some(record) = request.as_object() else {
            return Err(SaleError::Validation(
                ValidationError::InvalidFormat {
                    field: "request".to_string(),
                    reason: "must be a JSON object".to_string(),
                }
                .into(),
            ));
        };

        let mut v = Validator::new();
        let items = list_field(&mut v, record, "items");
        let payments = list_field(&mut v, record, "payments");
        self.build(v, items, payments, record)
    }

    /// `None` for a list means its shape was already reported.
    fn build(
        &self,
        mut v: Validator,
        raw_items: Option<&[Value]>,
        raw_payments: Option<&[Value]>,
        adj: &Map<String, Value>,
    ) -> CoreResult<Sale> {
        let items: Vec<SaleItem> = raw_items
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| self.item(&mut v, i, raw))
            .collect();

        let payments: Vec<Payment> = raw_payments
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| self.payment(&mut v, i, raw))
            .collect();

        let max_text = self.policy.max_text_len;
        let text_rule: Rule<'_, String> = &|f, s: &String| validate_text_len(f, s, max_text);

        let transaction_type = v
            .optional(
                "transactionType",
                adj.get("transactionType"),
                coerce_enum::<TransactionType>,
                &[],
            )
            .unwrap_or_default();
        let cashback = v.optional(
            "cashbackAmount",
            adj.get("cashbackAmount"),
            coerce_money,
            &[&validate_non_negative],
        );
        let service_charge = v.optional(
            "serviceCharge",
            adj.get("serviceCharge"),
            coerce_money,
            &[&validate_non_negative],
        );
        let customer_name = v.optional("customerName", adj.get("customerName"), coerce_text, &[text_rule]);
        let customer_phone = v.optional(
            "customerPhone",
            adj.get("customerPhone"),
            coerce_text,
            &[&|f, s: &String| validate_phone(f, s)],
        );
        let notes = v.optional("notes", adj.get("notes"), coerce_text, &[text_rule]);

        // Cross-field rules only judge fields that were themselves valid or
        // absent, so one bad value is reported once.
        let supplied = |key: &str| adj.get(key).is_some_and(|value| !is_blank(value));

        if let Some(raw_items) = raw_items {
            v.check(validate_collection_size("items", raw_items.len(), self.policy.max_items));

            let adjustment = cashback.is_some_and(|m| m.is_positive())
                || service_charge.is_some_and(|m| m.is_positive());
            let adjustments_judged = (cashback.is_some() || !supplied("cashbackAmount"))
                && (service_charge.is_some() || !supplied("serviceCharge"));
            if raw_items.is_empty()
                && adjustments_judged
                && !(self.policy.allow_adjustment_only && adjustment)
            {
                v.report(ValidationError::Required {
                    field: "items".to_string(),
                });
            }
        }

        if let Some(raw_payments) = raw_payments {
            if raw_payments.is_empty() {
                v.report(ValidationError::Required {
                    field: "payments".to_string(),
                });
            }
            v.check(validate_collection_size(
                "payments",
                raw_payments.len(),
                self.policy.max_payments,
            ));
        }

        match transaction_type {
            TransactionType::Cashback if cashback.is_some() || !supplied("cashbackAmount") => {
                if !cashback.is_some_and(|m| m.is_positive()) {
                    v.report(ValidationError::Conflict {
                        field: "cashbackAmount".to_string(),
                        reason: "must be greater than 0 for a CASHBACK transaction".to_string(),
                    });
                }
            }
            TransactionType::Service if service_charge.is_some() || !supplied("serviceCharge") => {
                if !service_charge.is_some_and(|m| m.is_positive()) {
                    v.report(ValidationError::Conflict {
                        field: "serviceCharge".to_string(),
                        reason: "must be greater than 0 for a SERVICE transaction".to_string(),
                    });
                }
            }
            _ => {}
        }

        let customer = Customer::from_parts(customer_name, customer_phone);
        let pays_on_credit = payments.iter().any(|p| p.method == PaymentMethod::Credit);
        let customer_judged = !supplied("customerName") && !supplied("customerPhone");
        if self.policy.require_customer_for_credit
            && pays_on_credit
            && customer.is_none()
            && customer_judged
        {
            v.report(ValidationError::Conflict {
                field: "customer".to_string(),
                reason: "is required when paying with CREDIT".to_string(),
            });
        }

        // Limits loose enough to overflow i64 are refused here, not wrapped.
        let subtotal = compute_subtotal(&items);
        let amount_due = subtotal
            .and_then(|s| s.checked_add(cashback.unwrap_or_default()))
            .and_then(|d| d.checked_add(service_charge.unwrap_or_default()));
        if amount_due.is_none() {
            v.report(total_out_of_range("items"));
        }
        let total_paid = Money::checked_sum(payments.iter().map(Payment::amount));
        if total_paid.is_none() {
            v.report(total_out_of_range("payments"));
        }

        v.finish().map_err(SaleError::from_collected)?;

        Ok(Sale::assemble(
            items,
            payments,
            transaction_type,
            cashback,
            service_charge,
            customer,
            notes,
            SaleTotals {
                subtotal: subtotal.unwrap_or_default(),
                total_paid: total_paid.unwrap_or_default(),
            },
        ))
    }

    fn item(&self, v: &mut Validator, index: usize, raw: &Value) -> Option<SaleItem> {
        let path = format!("items[{}]", index);
        let Some(obj) = raw.as_object() else {
            v.report(ValidationError::InvalidFormat {
                field: path,
                reason: "must be an object".to_string(),
            });
            return None;
        };

        let max_qty = self.policy.max_item_quantity;

        let product_id = v.required(
            &format!("{}.productId", path),
            obj.get("productId"),
            coerce_text,
            &[],
        );
        let variant_id = v.optional(
            &format!("{}.variantId", path),
            obj.get("variantId"),
            coerce_text,
            &[],
        );
        let quantity = v.required(
            &format!("{}.quantity", path),
            obj.get("quantity"),
            coerce_integer,
            &[&|f, q: &i64| validate_quantity(f, *q, max_qty)],
        );
        let unit_price = v.required(
            &format!("{}.unitPrice", path),
            obj.get("unitPrice"),
            coerce_money,
            &[&validate_non_negative],
        );

        Some(SaleItem {
            product_id: product_id?,
            variant_id,
            quantity: quantity?,
            unit_price_cents: unit_price?.cents(),
        })
    }

    fn payment(&self, v: &mut Validator, index: usize, raw: &Value) -> Option<Payment> {
        let path = format!("payments[{}]", index);
        let Some(obj) = raw.as_object() else {
            v.report(ValidationError::InvalidFormat {
                field: path,
                reason: "must be an object".to_string(),
            });
            return None;
        };

        let min = self.policy.min_payment_cents;
        let max_text = self.policy.max_text_len;
        let text_rule: Rule<'_, String> = &|f, s: &String| validate_text_len(f, s, max_text);

        let method = v.required(
            &format!("{}.method", path),
            obj.get("method"),
            coerce_enum::<PaymentMethod>,
            &[],
        );
        let amount = v.required(
            &format!("{}.amount", path),
            obj.get("amount"),
            coerce_money,
            &[&|f, a: &Money| validate_payment_amount(f, a, min)],
        );
        let reference = v.optional(
            &format!("{}.reference", path),
            obj.get("reference"),
            coerce_text,
            &[text_rule],
        );
        let notes = v.optional(
            &format!("{}.notes", path),
            obj.get("notes"),
            coerce_text,
            &[text_rule],
        );

        Some(Payment {
            method: method?,
            amount_cents: amount?.cents(),
            reference,
            notes,
        })
    }
}

/// A running total that no longer fits in i64, reported in major units.
fn total_out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX / 100,
    }
}

/// Reads an array-valued key. Missing means empty; any other shape is
/// reported and yields `None`.
fn list_field<'a>(v: &mut Validator, record: &'a Map<String, Value>, key: &str) -> Option<&'a [Value]> {
    match record.get(key) {
        None | Some(Value::Null) => Some(&[]),
        Some(Value::Array(list)) => Some(list.as_slice()),
        Some(_) => {
            v.report(ValidationError::InvalidFormat {
                field: key.to_string(),
                reason: "must be an array".to_string(),
            });
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
