//! # atlas-core: Sale Validation for Atlas POS
//!
//! This crate turns raw sale requests into validated, immutable sales. It is
//! pure: no database, no network, no logging, no clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atlas POS Backend                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP layer (routing, auth, 4xx mapping)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON body                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            atlas-sales: SaleIntake (config, tracing)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ atlas-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ aggregator │  │ validation│  │   │
//! │  │   │   Sale    │  │   Money   │  │ build Sale │  │  runner   │  │   │
//! │  │   │  Payment  │  │  parsing  │  │ subtotal   │  │  rules    │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                  ┌────────────────┐  ┌──────────┐               │   │
//! │  │                  │ reconciliation │  │  policy  │               │   │
//! │  │                  └────────────────┘  └──────────┘               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ Sale                                   │
//! │                                ▼                                        │
//! │       persistence, inventory adjustment, audit (elsewhere)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, SaleItem, Payment, enumerations)
//! - [`money`] - Integer-cent money with exact decimal parsing
//! - [`error`] - Validation and schema errors
//! - [`validation`] - Generic field validation runner and rules
//! - [`policy`] - Tunable limits
//! - [`aggregator`] - `validate_and_build`, `compute_subtotal`
//! - [`reconciliation`] - Amount due vs. amount paid under a caller policy
//!
//! ## Example Usage
//!
//! ```rust
//! use atlas_core::aggregator::SaleAggregator;
//! use serde_json::json;
//!
//! let sale = SaleAggregator::default()
//!     .build_from_request(&json!({
//!         "items": [
//!             {"productId": "coke-330", "quantity": 2, "unitPrice": "5.00"},
//!             {"productId": "chips", "quantity": 1, "unitPrice": 3.5}
//!         ],
//!         "payments": [{"method": "CASH", "amount": "13.50"}]
//!     }))
//!     .unwrap();
//!
//! assert_eq!(sale.subtotal().cents(), 1350);
//! assert!(sale.implied_discrepancy().is_zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod error;
pub mod money;
pub mod policy;
pub mod reconciliation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregator::{compute_subtotal, SaleAggregator};
pub use error::{CoreResult, FieldError, SaleError, SchemaError, ValidationError, ValidationErrors};
pub use money::Money;
pub use policy::SalePolicy;
pub use reconciliation::{reconcile, Reconciliation, ReconciliationPolicy, SettlementStatus};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches keying mistakes (1000 instead of 10) at the till.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum payments (split tenders) in a single sale.
pub const MAX_PAYMENTS: usize = 20;

/// Every payment must be strictly greater than this many cents.
pub const MIN_PAYMENT_CENTS: i64 = 1;

/// Default cap on free-text fields.
pub const DEFAULT_MAX_TEXT_LEN: usize = 500;

/// Largest absolute amount any single money field may carry (10 billion
/// major units). `SalePolicy::check` refuses limits that would let a sale
/// total leave `i64` at this price.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;
