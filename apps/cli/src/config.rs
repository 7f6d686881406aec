//! # Application Configuration
//!
//! Settings for the database, invoice defaults and the pending-draft file.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BILLWISE_DB_PATH=/srv/billwise/billwise.db                         │
//! │     BILLWISE_CURRENCY=USD                                              │
//! │     BILLWISE_TAX_RATE=18                                               │
//! │     BILLWISE_TAX_INCLUSIVE=true                                        │
//! │     BILLWISE_DRAFT_PATH=/tmp/pending.json                              │
//! │                                                                         │
//! │  2. TOML Config File (--config, or the platform default)               │
//! │     ~/.config/billwise/billwise.toml (Linux)                           │
//! │     ~/Library/Application Support/com.billwise.billwise/ (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     INR, exclusive tax, files under the platform data dir              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/home/me/.local/share/billwise/billwise.db"
//! max_connections = 5
//!
//! [invoice]
//! currency = "INR"
//! default_tax_rate = 18
//! tax_inclusive = false
//! automatic_tax = true
//!
//! [drafts]
//! path = "/home/me/.local/share/billwise/pending-draft.json"
//! ```

use std::path::PathBuf;

use billwise_core::{ExtractionDefaults, TaxRate, TaxSettings, DEFAULT_CURRENCY};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_FILE: &str = "billwise.toml";
const DATABASE_FILE: &str = "billwise.db";
const DRAFT_FILE: &str = "pending-draft.json";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available")]
    NoPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Where the record store lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Pool size. Default: 5
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    data_file(DATABASE_FILE)
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Defaults applied to invoices and extracted projects that leave them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSettings {
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Percentage, e.g. `18` or `8.25`.
    #[serde(default)]
    pub default_tax_rate: Option<Decimal>,

    #[serde(default)]
    pub tax_inclusive: bool,

    /// New line items pick up `default_tax_rate`.
    #[serde(default)]
    pub automatic_tax: bool,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        InvoiceSettings {
            currency: default_currency(),
            default_tax_rate: None,
            tax_inclusive: false,
            automatic_tax: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSettings {
    #[serde(default = "default_draft_path")]
    pub path: PathBuf,
}

fn default_draft_path() -> PathBuf {
    data_file(DRAFT_FILE)
}

impl Default for DraftSettings {
    fn default() -> Self {
        DraftSettings {
            path: default_draft_path(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "billwise", "billwise")
}

/// A file under the platform data dir, or the working directory when the
/// platform has none.
fn data_file(name: &str) -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}

// =============================================================================
// App Config
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub invoice: InvoiceSettings,

    #[serde(default)]
    pub drafts: DraftSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (billwise.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.invoice.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        if let Some(rate) = self.invoice.default_tax_rate {
            if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                return Err(ConfigError::Invalid(format!(
                    "default_tax_rate must be between 0 and 100, got: {}",
                    rate
                )));
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup; unparsable values are skipped.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("BILLWISE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(currency) = lookup("BILLWISE_CURRENCY") {
            self.invoice.currency = currency.trim().to_uppercase();
        }

        if let Some(rate) = lookup("BILLWISE_TAX_RATE") {
            match rate.trim().parse::<Decimal>() {
                Ok(parsed) => self.invoice.default_tax_rate = Some(parsed),
                Err(_) => warn!(rate = %rate, "Unparsable tax rate in environment"),
            }
        }

        if let Some(inclusive) = lookup("BILLWISE_TAX_INCLUSIVE") {
            match inclusive.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.invoice.tax_inclusive = true,
                "0" | "false" | "no" | "off" => self.invoice.tax_inclusive = false,
                _ => warn!(value = %inclusive, "Unknown tax-inclusive flag in environment"),
            }
        }

        if let Some(path) = lookup("BILLWISE_DRAFT_PATH") {
            self.drafts.path = PathBuf::from(path);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Tax settings for invoices that do not carry their own.
    pub fn tax_settings(&self) -> TaxSettings {
        TaxSettings {
            inclusive: self.invoice.tax_inclusive,
            automatic: self.invoice.automatic_tax,
            default_rate: self.invoice.default_tax_rate.map(TaxRate::from_percentage),
        }
    }

    pub fn extraction_defaults(&self) -> ExtractionDefaults {
        ExtractionDefaults {
            currency: self.invoice.currency.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.invoice.currency, "INR");
        assert_eq!(config.database.max_connections, 5);
        assert!(config.database.path.ends_with(DATABASE_FILE));
        assert!(config.drafts.path.ends_with(DRAFT_FILE));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.invoice.currency = "  ".into();
        assert!(config.validate().is_err());

        config.invoice.currency = "USD".into();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 2;
        config.invoice.default_tax_rate = Some(Decimal::from(101));
        assert!(config.validate().is_err());

        config.invoice.default_tax_rate = Some(Decimal::new(825, 2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [invoice]
            currency = "USD"
            default_tax_rate = 18
            automatic_tax = true
            "#,
        )
        .unwrap();

        assert_eq!(config.invoice.currency, "USD");
        assert_eq!(config.invoice.default_tax_rate, Some(Decimal::from(18)));
        assert_eq!(config.database, DatabaseSettings::default());

        let settings = config.tax_settings();
        assert!(settings.automatic);
        assert_eq!(settings.rate_for_new_item(), TaxRate::from_bps(1800));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BILLWISE_DB_PATH", "/tmp/other.db"),
            ("BILLWISE_CURRENCY", " usd "),
            ("BILLWISE_TAX_RATE", "not-a-number"),
            ("BILLWISE_TAX_INCLUSIVE", "yes"),
        ]);

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.invoice.currency, "USD");
        assert_eq!(config.invoice.default_tax_rate, None);
        assert!(config.invoice.tax_inclusive);
        assert_eq!(config.drafts, DraftSettings::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("billwise-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.invoice.currency = "EUR".into();
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[invoice]"));

        let loaded: AppConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.invoice.currency, "EUR");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
