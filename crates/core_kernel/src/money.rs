//! Money types with precise decimal arithmetic
//!
//! All monetary figures in the engine are `rust_decimal` values tagged with a
//! currency. Binary floating point never touches an amount. Rounding happens
//! only at the explicit helpers below, always half away from zero:
//!
//! - [`round2`] for currency lines (rental charges, fees, tax)
//! - [`round0`] for whole-unit secondary currency display

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Rounds to two decimal places, half away from zero
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to a whole unit, half away from zero
pub fn round0(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    LBP,
    EUR,
    GBP,
    AED,
    SAR,
}

impl Currency {
    /// Returns the number of decimal places used when presenting this currency
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::LBP => 0,
            _ => 2,
        }
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::LBP => "L.L.",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::AED => "AED",
            Currency::SAR => "SAR",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::LBP => "LBP",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::AED => "AED",
            Currency::SAR => "SAR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "LBP" => Ok(Currency::LBP),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "AED" => Ok(Currency::AED),
            "SAR" => Ok(Currency::SAR),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// A monetary amount with associated currency
///
/// Amounts are held with up to 4 decimal places so that per-km rates and
/// exchange-rate products survive until the final `round2`/`round0` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Shorthand for a USD amount, the engine's home currency
    pub fn usd(amount: Decimal) -> Self {
        Self::new(amount, Currency::USD)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Rounds to two decimal places, half away from zero
    pub fn round2(&self) -> Self {
        Self {
            amount: round2(self.amount),
            currency: self.currency,
        }
    }

    /// Rounds to the currency's presentation precision, half away from zero
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                self.currency.decimal_places(),
                RoundingStrategy::MidpointAwayFromZero,
            ),
            currency: self.currency,
        }
    }

    /// Clamps negative amounts to zero
    pub fn floor_zero(&self) -> Self {
        if self.is_negative() {
            Money::zero(self.currency)
        } else {
            *self
        }
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    /// Multiplies by a scalar (days, kilometres, a rate)
    pub fn multiply(&self, factor: Decimal) -> Self {
        Self::new(self.amount * factor, self.currency)
    }

    /// True when the amount needs no more places than the currency shows
    ///
    /// `50.10` and `50.1000` pass in USD; `33.335` does not.
    pub fn is_minor_unit_precise(&self) -> bool {
        self.amount.normalize().scale() <= self.currency.decimal_places()
    }

    /// Converts into another currency at `rate` units of target per unit of self
    ///
    /// The result is rounded to the target currency's presentation precision.
    pub fn convert(&self, target: Currency, rate: Decimal) -> Result<Money, MoneyError> {
        if rate.is_sign_negative() || rate.is_zero() {
            return Err(MoneyError::InvalidAmount(format!(
                "exchange rate must be positive, got {}",
                rate
            )));
        }
        Ok(Money::new(self.amount * rate, target).round_to_currency())
    }

    /// Sums an iterator of amounts in a single currency
    pub fn sum<'a, I>(currency: Currency, items: I) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(&other)
            .expect("Currency mismatch in Money::add")
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(&other)
            .expect("Currency mismatch in Money::sub")
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.amount, self.currency)
    }
}

/// A percentage rate such as VAT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// The rate as a decimal (e.g., 0.11 for 11%)
    value: Decimal,
}

impl Rate {
    /// Creates a rate from a decimal value (e.g., 0.11 for 11%)
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Creates a rate from a percentage (e.g., 11 for 11%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self {
            value: percentage / dec!(100),
        }
    }

    /// Returns the rate as a decimal
    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    /// Returns the rate as a percentage
    pub fn as_percentage(&self) -> Decimal {
        self.value * dec!(100)
    }

    /// Applies this rate to a money amount, rounding the result to cents
    pub fn apply(&self, money: &Money) -> Money {
        money.multiply(self.value).round2()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_is_half_away_from_zero() {
        assert_eq!(round2(dec!(2.345)), dec!(2.35));
        assert_eq!(round2(dec!(-2.345)), dec!(-2.35));
        assert_eq!(round2(dec!(2.344)), dec!(2.34));
    }

    #[test]
    fn test_round0_is_half_away_from_zero() {
        assert_eq!(round0(dec!(34848449.5)), dec!(34848450));
        assert_eq!(round0(dec!(10.49)), dec!(10));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::usd(dec!(100.00));
        let b = Money::usd(dec!(50.00));

        assert_eq!((a + b).amount(), dec!(150.00));
        assert_eq!((a - b).amount(), dec!(50.00));
    }

    #[test]
    fn test_currency_mismatch() {
        let usd = Money::usd(dec!(100.00));
        let lbp = Money::new(dec!(8970000), Currency::LBP);

        let result = usd.checked_add(&lbp);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_convert_to_lbp_rounds_to_whole_pounds() {
        let total = Money::usd(dec!(388.50));
        let lbp = total.convert(Currency::LBP, dec!(89700)).unwrap();

        assert_eq!(lbp.currency(), Currency::LBP);
        assert_eq!(lbp.amount(), dec!(34848450));
    }

    #[test]
    fn test_convert_rejects_non_positive_rate() {
        let total = Money::usd(dec!(10));
        assert!(total.convert(Currency::LBP, dec!(0)).is_err());
    }

    #[test]
    fn test_vat_rate_application() {
        let vat = Rate::from_percentage(dec!(11));
        let subtotal = Money::usd(dec!(350.00));

        assert_eq!(vat.apply(&subtotal).amount(), dec!(38.50));
        assert_eq!(vat.to_string(), "11%");
    }

    #[test]
    fn test_floor_zero() {
        assert!(Money::usd(dec!(-5)).floor_zero().is_zero());
        assert_eq!(Money::usd(dec!(5)).floor_zero().amount(), dec!(5));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("lbp".parse::<Currency>().unwrap(), Currency::LBP);
        assert!("XYZ".parse::<Currency>().is_err());
    }
}
