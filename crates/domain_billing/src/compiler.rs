//! Invoice compilation
//!
//! Builds an invoice from a contract:
//!
//! | Line        | Quantity     | Unit price   | When            |
//! |-------------|--------------|--------------|-----------------|
//! | Rental      | rental days  | daily rate   | always          |
//! | KM overage  | overage km   | per-km rate  | fee is non-zero |
//! | Late fee    | days late    | daily rate   | fee is non-zero |
//! | Discount    | 1            | −discount    | discount > 0    |
//!
//! The lines must add up to `final_amount + over_limit_km_fee + late_fee`;
//! compilation fails otherwise. Tax is `round2(subtotal × VAT)` and the
//! secondary-currency figures are `round0(amount × exchange_rate)`.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{round0, Currency, Money, Rate};
use domain_rental::RentalContract;

use crate::error::BillingError;
use crate::invoice::{CurrencyProjection, InvoiceDraft, InvoiceLineItem, LineItemKind};
use crate::settings::CountryFinancialSettings;

/// Billing parameters supplied by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// VAT as a fraction, 0.11 for 11%
    pub vat_rate: Decimal,
    pub secondary_currency: Currency,
    /// Units of the secondary currency per unit of the invoice currency
    pub exchange_rate: Decimal,
    pub due_days: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            vat_rate: dec!(0.11),
            secondary_currency: Currency::LBP,
            exchange_rate: dec!(89700),
            due_days: 30,
        }
    }
}

impl BillingConfig {
    /// Takes VAT and exchange rate from a country's financial settings
    pub fn with_country_settings(mut self, settings: &CountryFinancialSettings) -> Self {
        self.vat_rate = settings.vat_rate / dec!(100);
        self.exchange_rate = settings.usd_exchange_rate;
        self
    }

    /// Checks the configured figures
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.vat_rate.is_sign_negative() || self.vat_rate >= Decimal::ONE {
            return Err(BillingError::validation("VAT rate must be in [0, 1)"));
        }
        if self.exchange_rate <= Decimal::ZERO {
            return Err(BillingError::validation("exchange rate must be positive"));
        }
        Ok(())
    }
}

/// Compiles the invoice for `contract` dated `invoice_date`
///
/// # Errors
///
/// Returns `BillingError::Unreconciled` if the lines do not reproduce the
/// contract's figures, or a validation error for bad configuration
pub fn compile_invoice(
    contract: &RentalContract,
    config: &BillingConfig,
    invoice_date: NaiveDate,
) -> Result<InvoiceDraft, BillingError> {
    config.validate()?;
    let currency = contract.currency();
    let mut line_items = Vec::with_capacity(4);

    let rental = InvoiceLineItem::new(
        LineItemKind::Rental,
        format!("Car rental, contract {}", contract.contract_number()),
        Decimal::from(contract.rental_days()),
        contract.daily_rate(),
    );
    if rental.amount != contract.total_amount() {
        return Err(BillingError::Unreconciled {
            expected: contract.total_amount().amount(),
            actual: rental.amount.amount(),
        });
    }
    line_items.push(rental);

    if !contract.over_limit_km_fee().is_zero() {
        let unit = contract
            .over_limit_km_rate()
            .ok_or_else(|| BillingError::validation("KM overage fee recorded without a per-km rate"))?;
        line_items.push(InvoiceLineItem::new(
            LineItemKind::KmOverage,
            format!("Distance over {} km limit", contract.km_limit().unwrap_or_default()),
            Decimal::from(contract.overage_km()),
            unit,
        ));
    }

    if !contract.late_fee().is_zero() {
        line_items.push(InvoiceLineItem::new(
            LineItemKind::LateFee,
            "Late return",
            Decimal::from(contract.days_late()),
            contract.daily_rate(),
        ));
    }

    if contract.discount().is_positive() {
        line_items.push(InvoiceLineItem::new(
            LineItemKind::Discount,
            "Discount",
            Decimal::ONE,
            -contract.discount(),
        ));
    }

    let subtotal = Money::sum(currency, line_items.iter().map(|l| &l.amount))?;
    let expected = contract.amount_due()?;
    if subtotal != expected {
        return Err(BillingError::Unreconciled {
            expected: expected.amount(),
            actual: subtotal.amount(),
        });
    }

    let tax_rate = Rate::new(config.vat_rate);
    let tax_amount = tax_rate.apply(&subtotal);
    let total_amount = subtotal.checked_add(&tax_amount)?;

    let project = |m: &Money| Money::new(round0(m.amount() * config.exchange_rate), config.secondary_currency);
    let projection = CurrencyProjection {
        currency: config.secondary_currency,
        exchange_rate: config.exchange_rate,
        subtotal: project(&subtotal),
        tax_amount: project(&tax_amount),
        total_amount: project(&total_amount),
    };

    Ok(InvoiceDraft {
        contract_id: contract.id(),
        contract_number: contract.contract_number().to_string(),
        client_name: contract.client().full_name(),
        invoice_date,
        due_date: invoice_date + Duration::days(i64::from(config.due_days)),
        currency,
        line_items,
        subtotal,
        tax_rate,
        tax_amount,
        total_amount,
        projection,
        notes: contract.return_notes().map(str::to_string),
    })
}
