//! Country financial settings
//!
//! VAT rate and official USD exchange rate per country, used to seed billing
//! configuration for a company's home country.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// VAT rate and exchange rate for one country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryFinancialSettings {
    /// VAT in percent, 11 for 11%
    pub vat_rate: Decimal,
    /// Units of local currency per USD
    pub usd_exchange_rate: Decimal,
}

/// VAT applied when a country is not listed
pub const DEFAULT_VAT_PERCENT: Decimal = dec!(11);

/// LBP per USD used when no rate is configured
pub const DEFAULT_LBP_RATE: Decimal = dec!(89700);

static SETTINGS: Lazy<HashMap<&'static str, CountryFinancialSettings>> = Lazy::new(|| {
    let entries: [(&str, Decimal, Decimal); 24] = [
        ("Lebanon", dec!(11), dec!(89500)),
        ("United Arab Emirates", dec!(5), dec!(3.6725)),
        ("UAE", dec!(5), dec!(3.6725)),
        ("Saudi Arabia", dec!(15), dec!(3.75)),
        ("Qatar", dec!(5), dec!(3.64)),
        ("Kuwait", dec!(0), dec!(0.3071)),
        ("Bahrain", dec!(0), dec!(0.377)),
        ("Oman", dec!(0), dec!(0.3845)),
        ("Jordan", dec!(16), dec!(0.709)),
        ("Egypt", dec!(14), dec!(30.9)),
        ("Iraq", dec!(0), dec!(1310)),
        ("Syria", dec!(0), dec!(2512)),
        ("Turkey", dec!(18), dec!(32.5)),
        ("Cyprus", dec!(19), dec!(0.92)),
        ("United Kingdom", dec!(20), dec!(0.79)),
        ("France", dec!(20), dec!(0.92)),
        ("Germany", dec!(19), dec!(0.92)),
        ("Italy", dec!(22), dec!(0.92)),
        ("Spain", dec!(21), dec!(0.92)),
        ("United States", dec!(0), dec!(1.0)),
        ("Canada", dec!(5), dec!(1.36)),
        ("Morocco", dec!(20), dec!(10.1)),
        ("South Africa", dec!(15), dec!(18.5)),
        ("India", dec!(18), dec!(83.5)),
    ];
    entries
        .into_iter()
        .map(|(country, vat_rate, usd_exchange_rate)| {
            (country, CountryFinancialSettings { vat_rate, usd_exchange_rate })
        })
        .collect()
});

/// Looks up a country's settings by its English name
pub fn financial_settings(country: &str) -> Option<CountryFinancialSettings> {
    SETTINGS.get(country).copied()
}

/// VAT percent for a country, falling back to the default
pub fn vat_percent(country: &str) -> Decimal {
    financial_settings(country).map_or(DEFAULT_VAT_PERCENT, |s| s.vat_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_countries() {
        let lebanon = financial_settings("Lebanon").unwrap();
        assert_eq!(lebanon.vat_rate, dec!(11));
        assert_eq!(lebanon.usd_exchange_rate, dec!(89500));
        assert_eq!(financial_settings("UAE"), financial_settings("United Arab Emirates"));
    }

    #[test]
    fn test_unknown_country_uses_default_vat() {
        assert!(financial_settings("Atlantis").is_none());
        assert_eq!(vat_percent("Atlantis"), DEFAULT_VAT_PERCENT);
    }
}
