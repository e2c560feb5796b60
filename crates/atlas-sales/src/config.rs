//! # Sales Configuration
//!
//! Configuration management for sale intake.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ATLAS_MAX_ITEMS=50                                                 │
//! │     ATLAS_RECONCILE_TOLERANCE_CENTS=2                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/atlas-pos/sales.toml (Linux)                             │
//! │     ~/Library/Application Support/com.atlas.pos/sales.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     100 items, 999 per line, exact reconciliation with cash change     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sales.toml
//! [policy]
//! max_items = 100
//! max_item_quantity = 999
//! min_payment_cents = 1
//! allow_adjustment_only = true
//! require_customer_for_credit = true
//!
//! [reconciliation]
//! tolerance_cents = 0
//! allow_cash_change = true
//!
//! [logging]
//! filter = "info,atlas=debug"
//! ```

use atlas_core::{ReconciliationPolicy, SalePolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

// =============================================================================
// Errors
// =============================================================================

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is outside its allowed range.
    #[error("Invalid sales configuration: {0}")]
    Invalid(String),

    #[error("No config path available")]
    NoConfigPath,
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directives. `RUST_LOG` still wins.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,atlas=debug".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Main Sales Configuration
// =============================================================================

/// Complete intake configuration.
///
/// ## Example Config File
/// ```toml
/// [policy]
/// max_items = 40
///
/// [reconciliation]
/// tolerance_cents = 2
/// allow_cash_change = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesConfig {
    /// Limits applied while validating a sale.
    #[serde(default)]
    pub policy: SalePolicy,

    /// How closely payments must match the amount due.
    #[serde(default)]
    pub reconciliation: ReconciliationPolicy,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl SalesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sales.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Same as [`SalesConfig::load`] with a caller-supplied variable lookup.
    pub fn load_with<F>(config_path: Option<PathBuf>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sales config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(lookup);
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sales config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sales config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.policy.check().map_err(ConfigError::Invalid)?;

        if self.reconciliation.tolerance_cents < 0 {
            return Err(ConfigError::Invalid(
                "tolerance_cents must not be negative".into(),
            ));
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.filter) {
            return Err(ConfigError::Invalid(format!(
                "logging filter '{}' is not valid: {}",
                self.logging.filter, e
            )));
        }

        Ok(())
    }

    /// Applies `ATLAS_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parsed::<usize>(&lookup, "ATLAS_MAX_ITEMS") {
            debug!(max_items = v, "Overriding max items from environment");
            self.policy.max_items = v;
        }

        if let Some(v) = parsed::<i64>(&lookup, "ATLAS_MAX_ITEM_QUANTITY") {
            self.policy.max_item_quantity = v;
        }

        if let Some(v) = parsed::<i64>(&lookup, "ATLAS_MIN_PAYMENT_CENTS") {
            self.policy.min_payment_cents = v;
        }

        if let Some(v) = parsed::<bool>(&lookup, "ATLAS_ALLOW_ADJUSTMENT_ONLY") {
            self.policy.allow_adjustment_only = v;
        }

        if let Some(v) = parsed::<i64>(&lookup, "ATLAS_RECONCILE_TOLERANCE_CENTS") {
            debug!(tolerance_cents = v, "Overriding reconciliation tolerance from environment");
            self.reconciliation.tolerance_cents = v;
        }

        if let Some(v) = parsed::<bool>(&lookup, "ATLAS_ALLOW_CASH_CHANGE") {
            self.reconciliation.allow_cash_change = v;
        }

        if let Some(filter) = lookup("ATLAS_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "atlas", "pos")
            .map(|dirs| dirs.config_dir().join("sales.toml"))
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("atlas-sales-config-{}", std::process::id()))
            .join(name)
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SalesConfig::default();
        assert_eq!(config.policy.max_items, 100);
        assert_eq!(config.reconciliation.tolerance_cents, 0);
        assert!(config.reconciliation.allow_cash_change);
        assert_eq!(config.logging.filter, "info,atlas=debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_then_env() {
        let path = temp_path("file_then_env.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "[policy]\nmax_items = 10\nmax_item_quantity = 50\n\n[reconciliation]\ntolerance_cents = 3\n",
        )
        .unwrap();

        let config = SalesConfig::load_with(
            Some(path.clone()),
            vars(&[("ATLAS_MAX_ITEMS", "20"), ("ATLAS_ALLOW_CASH_CHANGE", "false")]),
        )
        .unwrap();

        assert_eq!(config.policy.max_items, 20);
        assert_eq!(config.policy.max_item_quantity, 50);
        assert_eq!(config.policy.max_payments, 20);
        assert_eq!(config.reconciliation.tolerance_cents, 3);
        assert!(!config.reconciliation.allow_cash_change);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = SalesConfig::load_with(Some(temp_path("does-not-exist.toml")), vars(&[])).unwrap();
        assert_eq!(config, SalesConfig::default());
    }

    #[test]
    fn test_unparseable_override_is_ignored() {
        let config = SalesConfig::load_with(
            Some(temp_path("absent.toml")),
            vars(&[("ATLAS_MAX_ITEMS", "lots"), ("ATLAS_LOG", "warn")]),
        )
        .unwrap();
        assert_eq!(config.policy.max_items, 100);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_config_validation() {
        let mut config = SalesConfig::default();
        assert!(config.validate().is_ok());

        config.policy.max_items = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.policy.max_items = 10;
        config.reconciliation.tolerance_cents = -1;
        assert!(config.validate().is_err());

        config.reconciliation.tolerance_cents = 0;
        config.logging.filter = "atlas=loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_env_value_fails_validation() {
        let result = SalesConfig::load_with(
            Some(temp_path("absent.toml")),
            vars(&[("ATLAS_MIN_PAYMENT_CENTS", "-1")]),
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_limits_that_overflow_totals_are_refused() {
        let result = SalesConfig::load_with(
            Some(temp_path("absent.toml")),
            vars(&[("ATLAS_MAX_ITEM_QUANTITY", "100000000")]),
        );
        match result {
            Err(ConfigError::Invalid(reason)) => assert!(reason.contains("max_item_quantity")),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let path = temp_path("bad.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[policy]\nmax_items = \"many\"\n").unwrap();

        let result = SalesConfig::load_with(Some(path.clone()), vars(&[]));
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_path("saved/sales.toml");
        let mut config = SalesConfig::default();
        config.policy.max_payments = 4;
        config.reconciliation.tolerance_cents = 1;
        config.save(Some(path.clone())).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[policy]"));
        assert!(text.contains("[reconciliation]"));

        let reloaded = SalesConfig::load_with(Some(path.clone()), vars(&[])).unwrap();
        assert_eq!(reloaded, config);

        std::fs::remove_file(path).ok();
    }
}
