//! Initial pricing and renewal
//!
//! # Formulas
//!
//! ```text
//! total_amount   = round2(daily_rate × rental_days)
//! final_amount   = max(0, total_amount − discount)
//! renewal cost   = round2(daily_rate × additional_days)
//! ```
//!
//! `rental_days` is supplied by the caller and trusted; it is not recomputed
//! from the date span.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ContractId, Money, RentalPeriod};

use crate::contract::{ContractStatus, RentalContract, StatusMarker};
use crate::error::RentalError;
use crate::events::ContractEvent;

/// Priced figures for a new booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingQuote {
    pub daily_rate: Money,
    pub rental_days: u32,
    pub total_amount: Money,
    pub discount: Money,
    pub final_amount: Money,
}

/// Prices a booking
///
/// # Arguments
///
/// * `daily_rate` - Per-day rate, after tier selection or an explicit override
/// * `rental_days` - Number of billable days, at least 1
/// * `discount` - Flat discount off the total
///
/// # Errors
///
/// Returns `RentalError::Validation` if the rate or discount is negative or
/// finer than a cent, `rental_days` is zero, or the discount exceeds the total
pub fn price_rental(daily_rate: Money, rental_days: u32, discount: Money) -> Result<PricingQuote, RentalError> {
    if rental_days < 1 {
        return Err(RentalError::validation("rental days must be at least 1"));
    }
    check_amount("daily rate", &daily_rate)?;
    check_amount("discount", &discount)?;

    let total_amount = daily_rate.multiply(Decimal::from(rental_days)).round2();
    let net = total_amount.checked_sub(&discount)?;
    if net.is_negative() {
        return Err(RentalError::validation(format!(
            "discount {} exceeds total {}",
            discount, total_amount
        )));
    }

    Ok(PricingQuote {
        daily_rate,
        rental_days,
        total_amount,
        discount,
        final_amount: net.floor_zero(),
    })
}

/// Rejects negative amounts and amounts finer than the currency's minor unit
///
/// Renewals add `round2(rate × days)` per extension, which only composes
/// when `rate × days` is already exact.
pub(crate) fn check_amount(label: &str, amount: &Money) -> Result<(), RentalError> {
    if amount.is_negative() {
        return Err(RentalError::validation(format!("{} must not be negative", label)));
    }
    if !amount.is_minor_unit_precise() {
        return Err(RentalError::validation(format!(
            "{} {} has more decimal places than {} allows",
            label,
            amount.amount(),
            amount.currency()
        )));
    }
    Ok(())
}

/// A priced extension of an open contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalQuote {
    pub contract_id: ContractId,
    pub additional_days: u32,
    pub previous_end: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
    pub additional_cost: Money,
    /// The added window `[previous_end, new_end)`, checked for conflicts
    pub extension: RentalPeriod,
}

/// Prices extending `contract` by `additional_days` calendar days
///
/// # Errors
///
/// Returns `RentalError::Validation` if the contract is completed or
/// `additional_days` is zero
pub fn quote_renewal(contract: &RentalContract, additional_days: u32) -> Result<RenewalQuote, RentalError> {
    contract.ensure_open()?;
    if additional_days < 1 {
        return Err(RentalError::validation("additional days must be at least 1"));
    }

    let extended = contract.period().extended_by_days(additional_days);
    let extension = RentalPeriod::new(contract.rental_end(), extended.end())?;

    Ok(RenewalQuote {
        contract_id: contract.id(),
        additional_days,
        previous_end: contract.rental_end(),
        new_end: extended.end(),
        additional_cost: contract
            .daily_rate()
            .multiply(Decimal::from(additional_days))
            .round2(),
        extension,
    })
}

impl RentalContract {
    /// Commits a renewal quote to the contract
    ///
    /// Rental days and total grow by the quoted amounts and the final amount
    /// is recomputed against the existing discount. An explicit `overdue`
    /// status is cleared back to derivation since the window re-opens.
    ///
    /// # Errors
    ///
    /// Returns `RentalError::Validation` if the quote was made for another
    /// contract or against an end date that has since moved
    pub fn apply_renewal(&mut self, quote: &RenewalQuote, now: DateTime<Utc>) -> Result<(), RentalError> {
        self.ensure_open()?;
        if quote.contract_id != self.id || quote.previous_end != self.period.end() {
            return Err(RentalError::validation("renewal quote is stale for this contract"));
        }

        self.period = self.period.extended_by_days(quote.additional_days);
        self.rental_days += quote.additional_days;
        self.total_amount = self.total_amount.checked_add(&quote.additional_cost)?;
        self.recompute_final()?;
        if self.status == StatusMarker::Explicit(ContractStatus::Overdue) {
            self.status = StatusMarker::Derive;
        }
        self.touch(now);

        self.events.push(ContractEvent::ContractRenewed {
            contract_id: self.id,
            additional_days: quote.additional_days,
            additional_cost: quote.additional_cost.amount(),
            new_end: quote.new_end,
            timestamp: now,
        });
        Ok(())
    }
}
