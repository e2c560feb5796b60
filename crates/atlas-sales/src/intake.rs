//! # Sale Intake
//!
//! The service boundary for new sales: validate, reconcile, stamp.
//!
//! ## Submit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SaleIntake::submit                              │
//! │                                                                         │
//! │  JSON request ──► SaleAggregator::build_from_request                    │
//! │                        │                                                │
//! │                        ├── Err(SaleError) ──► ApiError (400 / 422)      │
//! │                        ▼                                                │
//! │                  reconcile(sale, configured policy)                     │
//! │                        │                                                │
//! │                        ├── unsettled ───────► ApiError PAYMENT_MISMATCH │
//! │                        ▼                                                │
//! │                  AcceptedSale { id: UUID v4, received_at: now, ... }    │
//! │                        │                                                │
//! │                        ▼                                                │
//! │        persistence and inventory adjustment (caller's concern)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! `SaleIntake` is immutable after construction and cheap to clone; share
//! one instance across request handlers.

use std::sync::Arc;

use atlas_core::{reconcile, Money, Reconciliation, Sale, SaleAggregator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SalesConfig;
use crate::error::ApiError;

/// A sale that passed validation and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedSale {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    pub sale: Sale,
    pub reconciliation: Reconciliation,
}

impl AcceptedSale {
    /// Cash to hand back to the customer.
    pub fn change_due(&self) -> Money {
        self.reconciliation.change_due()
    }
}

/// Validates and reconciles incoming sales under a fixed configuration.
#[derive(Debug, Clone)]
pub struct SaleIntake {
    config: Arc<SalesConfig>,
    aggregator: SaleAggregator,
}

impl SaleIntake {
    pub fn new(config: SalesConfig) -> Self {
        let aggregator = SaleAggregator::new(config.policy.clone());
        SaleIntake {
            config: Arc::new(config),
            aggregator,
        }
    }

    pub fn config(&self) -> &SalesConfig {
        &self.config
    }

    /// Validates the request and reconciles it without accepting it.
    ///
    /// Useful for showing a running balance at the till before tender is
    /// final; an unsettled sale is not an error here.
    pub fn preview(&self, request: &Value) -> Result<(Sale, Reconciliation), ApiError> {
        let sale = self.aggregator.build_from_request(request)?;
        let outcome = reconcile(&sale, &self.config.reconciliation);
        Ok((sale, outcome))
    }

    /// Accepts a sale request.
    ///
    /// ## Errors
    /// - `VALIDATION_ERROR` / `SCHEMA_ERROR` when the request is malformed
    /// - `PAYMENT_MISMATCH` when payments do not settle the amount due
    pub fn submit(&self, request: &Value) -> Result<AcceptedSale, ApiError> {
        debug!(
            items = list_len(request, "items"),
            payments = list_len(request, "payments"),
            "Sale request received"
        );

        let (sale, outcome) = self.preview(request).map_err(|err| {
            warn!(
                code = %err.code,
                violations = err.violation_count(),
                "Sale rejected"
            );
            err
        })?;

        if !outcome.is_settled() {
            let err = ApiError::payment_mismatch(&outcome);
            warn!(
                code = %err.code,
                amount_due = %Money::from_cents(outcome.amount_due_cents),
                total_paid = %sale.total_paid(),
                "Sale rejected"
            );
            return Err(err);
        }

        let accepted = AcceptedSale {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            sale,
            reconciliation: outcome,
        };

        info!(
            sale_id = %accepted.id,
            items = accepted.sale.items().len(),
            subtotal = %accepted.sale.subtotal(),
            total_paid = %accepted.sale.total_paid(),
            change = %accepted.change_due(),
            "Sale accepted"
        );

        Ok(accepted)
    }
}

fn list_len(request: &Value, key: &str) -> usize {
    request
        .get(key)
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}
