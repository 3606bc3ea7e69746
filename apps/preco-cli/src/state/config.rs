//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--tax-policy`, `--db`)
//! 2. Environment variables (`PRECO_*`)
//! 3. Defaults (this file)
//!
//! Read-only after initialization.

use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

use crate::error::ApiError;
use preco_core::decimal::parse_decimal;
use preco_core::form::{DEFAULT_MARGIN, DEFAULT_TAX};
use preco_core::{Money, TaxPolicy};

/// Application configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Database file override (`PRECO_DB_PATH`).
    /// `None` means the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Tax policy used when no `--tax-policy` flag is given.
    /// Deliberately no default.
    pub tax_policy: Option<TaxPolicy>,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Decimal separator used for display (`,` for pt-BR)
    pub decimal_separator: char,

    /// Margin value used when `--margin` is omitted
    pub default_margin: String,

    /// Tax percentage used when `--tax` is omitted
    pub default_tax: String,
}

impl Default for ConfigState {
    /// ## Default Values
    /// - Currency: R$ with comma separator
    /// - Margin: 25%
    /// - Tax: 18%
    /// - Tax policy: none
    fn default() -> Self {
        ConfigState {
            db_path: None,
            tax_policy: None,
            currency_symbol: "R$".to_string(),
            decimal_separator: ',',
            default_margin: DEFAULT_MARGIN.to_string(),
            default_tax: DEFAULT_TAX.to_string(),
        }
    }
}

impl ConfigState {
    /// Creates a new ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `PRECO_DB_PATH`: Database file
    /// - `PRECO_TAX_POLICY`: `on-pre-tax-price` or `gross-up`
    /// - `PRECO_CURRENCY_SYMBOL`: e.g. `$`
    /// - `PRECO_DECIMAL_SEPARATOR`: `,` or `.`
    /// - `PRECO_DEFAULT_MARGIN`, `PRECO_DEFAULT_TAX`: e.g. `30`, `12,5`
    ///
    /// Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ConfigState::default();

        if let Some(path) = lookup("PRECO_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(policy) = lookup("PRECO_TAX_POLICY") {
            match policy.parse::<TaxPolicy>() {
                Ok(policy) => config.tax_policy = Some(policy),
                Err(e) => warn!(error = %e, "Ignoring PRECO_TAX_POLICY"),
            }
        }

        if let Some(symbol) = lookup("PRECO_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol.trim().to_string();
        }

        if let Some(sep) = lookup("PRECO_DECIMAL_SEPARATOR") {
            match sep.trim() {
                "," => config.decimal_separator = ',',
                "." => config.decimal_separator = '.',
                other => warn!(value = %other, "Ignoring PRECO_DECIMAL_SEPARATOR"),
            }
        }

        if let Some(margin) = lookup("PRECO_DEFAULT_MARGIN") {
            if parse_decimal(&margin).is_ok() {
                config.default_margin = margin.trim().to_string();
            } else {
                warn!(value = %margin, "Ignoring PRECO_DEFAULT_MARGIN");
            }
        }

        if let Some(tax) = lookup("PRECO_DEFAULT_TAX") {
            if parse_decimal(&tax).is_ok() {
                config.default_tax = tax.trim().to_string();
            } else {
                warn!(value = %tax, "Ignoring PRECO_DEFAULT_TAX");
            }
        }

        config
    }

    /// Picks the tax policy for this invocation: the flag, else the
    /// configured one. Refuses to guess.
    pub fn resolve_policy(&self, flag: Option<TaxPolicy>) -> Result<TaxPolicy, ApiError> {
        flag.or(self.tax_policy).ok_or_else(ApiError::policy_required)
    }

    /// Formats an amount as a currency string, e.g. `R$ 1239,00`.
    pub fn format_money(&self, amount: Money) -> String {
        amount.format(&self.currency_symbol, self.decimal_separator)
    }

    /// Formats percentage points with at most `dp` decimals, e.g. `18%`, `12,5%`.
    pub fn format_percent(&self, value: Decimal, dp: u32) -> String {
        let text = Money::new(value).round_dp(dp).amount().normalize().to_string();
        let text = if self.decimal_separator == '.' {
            text
        } else {
            text.replace('.', &self.decimal_separator.to_string())
        };
        format!("{}%", text)
    }

    /// Formats percentage points with exactly one decimal, e.g. `25,0%`.
    pub fn format_percent_fixed(&self, value: Decimal) -> String {
        let mut rounded = Money::new(value).round_dp(1).amount();
        rounded.rescale(1);
        let text = rounded.to_string();
        let text = if self.decimal_separator == '.' {
            text
        } else {
            text.replace('.', &self.decimal_separator.to_string())
        };
        format!("{}%", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ConfigState {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigState::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.currency_symbol, "R$");
        assert_eq!(config.decimal_separator, ',');
        assert_eq!(config.default_margin, "25");
        assert_eq!(config.default_tax, "18");
        assert!(config.tax_policy.is_none());
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("PRECO_DB_PATH", "/tmp/p.db"),
            ("PRECO_TAX_POLICY", "gross-up"),
            ("PRECO_CURRENCY_SYMBOL", "$"),
            ("PRECO_DECIMAL_SEPARATOR", "."),
            ("PRECO_DEFAULT_TAX", "12,5"),
        ]);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/p.db")));
        assert_eq!(config.tax_policy, Some(TaxPolicy::GrossUp));
        assert_eq!(config.format_money(Money::new(dec!(4.5))), "$ 4.50");
        assert_eq!(config.default_tax, "12,5");
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let config = config_from(&[
            ("PRECO_TAX_POLICY", "vat"),
            ("PRECO_DECIMAL_SEPARATOR", ";"),
            ("PRECO_DEFAULT_MARGIN", "lots"),
        ]);
        assert!(config.tax_policy.is_none());
        assert_eq!(config.decimal_separator, ',');
        assert_eq!(config.default_margin, "25");
    }

    #[test]
    fn test_resolve_policy_never_guesses() {
        let config = config_from(&[]);
        assert!(config.resolve_policy(None).is_err());
        assert_eq!(
            config.resolve_policy(Some(TaxPolicy::OnPreTaxPrice)).unwrap(),
            TaxPolicy::OnPreTaxPrice
        );

        let config = config_from(&[("PRECO_TAX_POLICY", "additive")]);
        assert_eq!(config.resolve_policy(None).unwrap(), TaxPolicy::OnPreTaxPrice);
        assert_eq!(
            config.resolve_policy(Some(TaxPolicy::GrossUp)).unwrap(),
            TaxPolicy::GrossUp
        );
    }

    #[test]
    fn test_format_percent() {
        let config = ConfigState::default();
        assert_eq!(config.format_percent(dec!(18), 2), "18%");
        assert_eq!(config.format_percent(dec!(12.50), 2), "12,5%");
        assert_eq!(config.format_percent(dec!(33.3333), 2), "33,33%");
        assert_eq!(config.format_percent_fixed(dec!(25)), "25,0%");
        assert_eq!(config.format_percent_fixed(dec!(30.04)), "30,0%");
    }

    #[test]
    fn test_format_money() {
        let config = ConfigState::default();
        assert_eq!(config.format_money(Money::new(dec!(1239))), "R$ 1239,00");
        assert_eq!(config.format_money(Money::new(dec!(1280.4878))), "R$ 1280,49");
    }
}
