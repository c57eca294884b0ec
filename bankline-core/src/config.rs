//! Configuration management
//!
//! Settings live in `settings.json` inside the bankline directory:
//! ```json
//! {
//!   "ledger": { "savingsInterestRate": "0.05", "checkingFeeRate": "0.10" },
//!   ...
//! }
//! ```
//! Keys this crate does not manage are kept untouched on save.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Environment override for the savings interest rate
pub const INTEREST_RATE_ENV: &str = "BANKLINE_INTEREST_RATE";

/// Environment override for the checking maintenance fee rate
pub const FEE_RATE_ENV: &str = "BANKLINE_FEE_RATE";

/// Default savings interest rate (5%)
pub fn default_interest_rate() -> Decimal {
    Decimal::new(5, 2)
}

/// Default checking maintenance fee rate (10%)
pub fn default_fee_rate() -> Decimal {
    Decimal::new(10, 2)
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    ledger: LedgerSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerSettings {
    #[serde(default = "default_interest_rate")]
    savings_interest_rate: Decimal,
    #[serde(default = "default_fee_rate")]
    checking_fee_rate: Decimal,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            savings_interest_rate: default_interest_rate(),
            checking_fee_rate: default_fee_rate(),
            other: HashMap::new(),
        }
    }
}

/// Bankline configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub savings_interest_rate: Decimal,
    pub checking_fee_rate: Decimal,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            savings_interest_rate: default_interest_rate(),
            checking_fee_rate: default_fee_rate(),
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the bankline directory
    ///
    /// Rates can be overridden via BANKLINE_INTEREST_RATE and
    /// BANKLINE_FEE_RATE (for CI/testing).
    pub fn load(bankline_dir: &Path) -> Result<Self> {
        let stored = Self::load_stored(bankline_dir)?;

        let savings_interest_rate = resolve_rate(
            stored.savings_interest_rate,
            std::env::var(INTEREST_RATE_ENV).ok(),
            INTEREST_RATE_ENV,
        )?;
        let checking_fee_rate = resolve_rate(
            stored.checking_fee_rate,
            std::env::var(FEE_RATE_ENV).ok(),
            FEE_RATE_ENV,
        )?;

        Ok(Self {
            savings_interest_rate,
            checking_fee_rate,
            ..stored
        })
    }

    /// Load only what settings.json holds, ignoring environment overrides
    ///
    /// Use this before `save` so an override is never written back.
    pub fn load_stored(bankline_dir: &Path) -> Result<Self> {
        let raw = read_settings(bankline_dir)?;
        Ok(Self {
            savings_interest_rate: raw.ledger.savings_interest_rate,
            checking_fee_rate: raw.ledger.checking_fee_rate,
            _raw_settings: raw,
        })
    }

    /// Save config to the bankline directory
    /// Preserves other settings that bankline doesn't manage
    pub fn save(&self, bankline_dir: &Path) -> Result<()> {
        let settings_path = bankline_dir.join("settings.json");

        let mut settings = read_settings(bankline_dir)?;
        settings.ledger.savings_interest_rate = self.savings_interest_rate;
        settings.ledger.checking_fee_rate = self.checking_fee_rate;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }
}

fn read_settings(bankline_dir: &Path) -> Result<SettingsFile> {
    let settings_path = bankline_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read {}", settings_path.display()))?;
    // A malformed file falls back to defaults rather than blocking every command
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

/// Pick the environment value over the stored one, rejecting negative rates
fn resolve_rate(stored: Decimal, env_value: Option<String>, name: &str) -> Result<Decimal> {
    let rate = match env_value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value
            .parse::<Decimal>()
            .with_context(|| format!("{} is not a decimal number: {}", name, value))?,
        _ => stored,
    };
    if rate < Decimal::ZERO {
        anyhow::bail!("{} cannot be negative (got {})", name, rate);
    }
    Ok(rate)
}
