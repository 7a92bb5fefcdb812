//! API configuration
//!
//! Loaded from `RENTAL_*` environment variables, nested sections separated by
//! `__` (`RENTAL_DATABASE__URL`, `RENTAL_BILLING__VAT_RATE`), over the serde
//! defaults below.

use serde::Deserialize;

use core_kernel::{TemporalError, Timezone};
use domain_billing::{financial_settings, BillingConfig};
use domain_fleet::AlertThresholds;
use domain_rental::RentalConfig;
use infra_db::DatabaseConfig;

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub rental: RentalConfig,
    pub billing: BillingConfig,
    pub alerts: AlertThresholds,
    /// Country whose VAT and exchange rate override the billing section
    pub country: Option<String>,
    /// IANA name of the business timezone used to bucket report dates
    pub timezone: String,
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::new("postgres://localhost/rental"),
            rental: RentalConfig::default(),
            billing: BillingConfig::default(),
            alerts: AlertThresholds::default(),
            country: None,
            timezone: "UTC".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("RENTAL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Billing settings with the country's VAT and exchange rate applied
    ///
    /// An unknown country leaves the billing section as configured.
    pub fn effective_billing(&self) -> BillingConfig {
        match self.country.as_deref().and_then(financial_settings) {
            Some(settings) => self.billing.with_country_settings(&settings),
            None => self.billing,
        }
    }

    pub fn business_timezone(&self) -> Result<Timezone, TemporalError> {
        Timezone::parse(&self.timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.rental.retry.max_attempts, 3);
        assert_eq!(config.effective_billing().vat_rate, dec!(0.11));
    }

    #[test]
    fn test_country_overrides_vat_and_rate() {
        let config = AppConfig {
            country: Some("Saudi Arabia".to_string()),
            ..AppConfig::default()
        };
        let billing = config.effective_billing();
        assert_eq!(billing.vat_rate, dec!(0.15));
        assert_eq!(billing.exchange_rate, dec!(3.75));
    }

    #[test]
    fn test_unknown_country_keeps_configured_billing() {
        let config = AppConfig {
            country: Some("Atlantis".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.effective_billing(), config.billing);
    }

    #[test]
    fn test_timezone_parses() {
        let config = AppConfig {
            timezone: "Asia/Beirut".to_string(),
            ..AppConfig::default()
        };
        assert!(config.business_timezone().is_ok());
    }
}
