//! # atlas-sales: Sale Intake Service for Atlas POS
//!
//! Puts configuration, logging, identifiers and API-shaped errors around the
//! pure aggregator in `atlas-core`.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Embedding the Intake                             │
//! │                                                                         │
//! │  1. Load Configuration ────────────────────────────────────────────────►│
//! │     • defaults → sales.toml → ATLAS_* environment                       │
//! │                                                                         │
//! │  2. Initialize Logging ────────────────────────────────────────────────►│
//! │     • tracing-subscriber with env filter                                │
//! │     • RUST_LOG first, then [logging] filter                             │
//! │                                                                         │
//! │  3. Build SaleIntake ──────────────────────────────────────────────────►│
//! │     • one instance, cloned into every request handler                   │
//! │                                                                         │
//! │  4. submit(request) per incoming sale ─────────────────────────────────►│
//! │     • AcceptedSale or ApiError with an HTTP status                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use atlas_sales::{SaleIntake, SalesConfig};
//! use serde_json::json;
//!
//! let intake = SaleIntake::new(SalesConfig::default());
//! let accepted = intake
//!     .submit(&json!({
//!         "items": [{"productId": "coke-330", "quantity": 2, "unitPrice": "1.50"}],
//!         "payments": [{"method": "CASH", "amount": "5.00"}]
//!     }))
//!     .unwrap();
//!
//! assert_eq!(accepted.change_due().to_string(), "2.00");
//! ```

pub mod config;
pub mod error;
pub mod intake;
pub mod telemetry;

pub use config::{ConfigError, ConfigResult, LoggingSettings, SalesConfig};
pub use error::{ApiError, ErrorCode};
pub use intake::{AcceptedSale, SaleIntake};

/// Loads configuration, installs logging and builds the intake.
///
/// Falls back to default configuration if the file cannot be used.
pub fn bootstrap(config_path: Option<std::path::PathBuf>) -> SaleIntake {
    let config = SalesConfig::load_or_default(config_path);
    telemetry::init_tracing(&config.logging.filter);
    tracing::info!(
        max_items = config.policy.max_items,
        tolerance_cents = config.reconciliation.tolerance_cents,
        "Sale intake ready"
    );
    SaleIntake::new(config)
}
