use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

use crate::core::{AppError, Result};

/// Billing configuration for installment schedules.
///
/// Fee rates are percentages keyed by period count; an unkeyed period count
/// cannot be financed. The fine rate is a percentage per overdue day applied
/// lazily when an overdue item is evaluated.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Series fee rate (percent) per supported period count
    pub fee_rates: BTreeMap<u32, Decimal>,
    /// Overdue fine rate, percent per day
    pub fine_rate_per_day: Decimal,
    /// Minimum principal eligible for financing
    pub min_principal: Decimal,
    /// Days between consecutive due dates
    pub period_days: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        let mut fee_rates = BTreeMap::new();
        fee_rates.insert(3, Decimal::new(15, 1)); // 1.5%
        fee_rates.insert(6, Decimal::from(2)); // 2%
        fee_rates.insert(12, Decimal::new(25, 1)); // 2.5%

        Self {
            fee_rates,
            fine_rate_per_day: Decimal::new(5, 2), // 0.05% per day
            min_principal: Decimal::from(300),
            period_days: 30,
        }
    }
}

impl BillingConfig {
    /// Load configuration from environment variables, falling back to the
    /// built-in defaults for anything unset.
    ///
    /// * `BILLING_FEE_RATES` - comma list of `count:percent` pairs, e.g. `3:1.5,6:2,12:2.5`
    /// * `BILLING_FINE_RATE_PER_DAY` - percent per overdue day
    /// * `BILLING_MIN_PRINCIPAL` - minimum financed amount
    /// * `BILLING_PERIOD_DAYS` - days between due dates
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let fee_rates = match env::var("BILLING_FEE_RATES") {
            Ok(raw) => Self::parse_fee_rates(&raw)?,
            Err(_) => defaults.fee_rates,
        };

        let config = Self {
            fee_rates,
            fine_rate_per_day: Self::env_decimal(
                "BILLING_FINE_RATE_PER_DAY",
                defaults.fine_rate_per_day,
            )?,
            min_principal: Self::env_decimal("BILLING_MIN_PRINCIPAL", defaults.min_principal)?,
            period_days: match env::var("BILLING_PERIOD_DAYS") {
                Ok(v) => v.parse().map_err(|_| {
                    AppError::configuration("Invalid BILLING_PERIOD_DAYS".to_string())
                })?,
                Err(_) => defaults.period_days,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Fee rate (percent) configured for a period count, if any
    pub fn fee_rate(&self, period_count: u32) -> Option<Decimal> {
        self.fee_rates.get(&period_count).copied()
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<()> {
        if self.fee_rates.is_empty() {
            return Err(AppError::configuration("No installment fee rates configured"));
        }
        for (count, rate) in &self.fee_rates {
            if *count == 0 {
                return Err(AppError::configuration("Fee rate keyed by zero period count"));
            }
            if *rate < Decimal::ZERO {
                return Err(AppError::configuration(format!(
                    "Negative fee rate for {} periods",
                    count
                )));
            }
        }
        if self.fine_rate_per_day < Decimal::ZERO {
            return Err(AppError::configuration("Fine rate cannot be negative"));
        }
        if self.min_principal <= Decimal::ZERO {
            return Err(AppError::configuration("Minimum principal must be positive"));
        }
        if self.period_days <= 0 {
            return Err(AppError::configuration("Period length must be positive"));
        }
        Ok(())
    }

    fn parse_fee_rates(raw: &str) -> Result<BTreeMap<u32, Decimal>> {
        let mut rates = BTreeMap::new();
        for pair in raw.split(',').filter(|p| !p.trim().is_empty()) {
            let (count, rate) = pair.split_once(':').ok_or_else(|| {
                AppError::configuration(format!("Invalid BILLING_FEE_RATES entry: {}", pair))
            })?;
            let count: u32 = count.trim().parse().map_err(|_| {
                AppError::configuration(format!("Invalid period count in BILLING_FEE_RATES: {}", pair))
            })?;
            let rate = Decimal::from_str(rate.trim()).map_err(|_| {
                AppError::configuration(format!("Invalid rate in BILLING_FEE_RATES: {}", pair))
            })?;
            rates.insert(count, rate);
        }
        Ok(rates)
    }

    fn env_decimal(key: &str, default: Decimal) -> Result<Decimal> {
        match env::var(key) {
            Ok(v) => Decimal::from_str(v.trim())
                .map_err(|_| AppError::configuration(format!("Invalid {}", key))),
            Err(_) => Ok(default),
        }
    }
}
