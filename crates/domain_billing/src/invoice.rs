//! Invoice management
//!
//! One invoice per rental contract. Figures are frozen when the invoice is
//! issued, including the exchange rate used for the secondary currency.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{round2, ContractId, Currency, InvoiceId, LineItemId, Money, Rate};

use crate::error::BillingError;
use crate::payment::{PaymentMethod, PaymentStatus};

/// What a line item charges for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    Rental,
    KmOverage,
    LateFee,
    Discount,
}

impl LineItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemKind::Rental => "rental",
            LineItemKind::KmOverage => "km_overage",
            LineItemKind::LateFee => "late_fee",
            LineItemKind::Discount => "discount",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rental" => Some(LineItemKind::Rental),
            "km_overage" => Some(LineItemKind::KmOverage),
            "late_fee" => Some(LineItemKind::LateFee),
            "discount" => Some(LineItemKind::Discount),
            _ => None,
        }
    }
}

/// A line on an invoice; `amount = round2(quantity × unit_price)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub id: LineItemId,
    pub kind: LineItemKind,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub amount: Money,
}

impl InvoiceLineItem {
    /// Creates a line, computing its amount
    pub fn new(kind: LineItemKind, description: impl Into<String>, quantity: Decimal, unit_price: Money) -> Self {
        Self {
            id: LineItemId::new_v7(),
            kind,
            description: description.into(),
            quantity,
            amount: Money::new(round2(quantity * unit_price.amount()), unit_price.currency()),
            unit_price,
        }
    }
}

/// Invoice figures shown in the secondary currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyProjection {
    pub currency: Currency,
    /// Units of `currency` per unit of the invoice currency, frozen at issue
    pub exchange_rate: Decimal,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
}

/// Compiled invoice awaiting a number from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub contract_id: ContractId,
    pub contract_number: String,
    pub client_name: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: Currency,
    pub line_items: Vec<InvoiceLineItem>,
    pub subtotal: Money,
    pub tax_rate: Rate,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub projection: CurrencyProjection,
    pub notes: Option<String>,
}

/// Formats an invoice sequence number as `INV-00001`
pub fn format_invoice_number(sequence: i64) -> String {
    format!("INV-{:05}", sequence)
}

/// Reads the sequence back out of an invoice number
pub fn parse_invoice_sequence(number: &str) -> Option<i64> {
    number.strip_prefix("INV-")?.parse().ok()
}

/// An issued invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Sequential number such as `INV-00042`
    pub invoice_number: String,
    pub contract_id: ContractId,
    pub contract_number: String,
    pub client_name: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: Currency,
    pub line_items: Vec<InvoiceLineItem>,
    /// Sum of line amounts
    pub subtotal: Money,
    pub tax_rate: Rate,
    pub tax_amount: Money,
    /// Subtotal plus tax
    pub total_amount: Money,
    pub projection: CurrencyProjection,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    /// Set when, and only when, the invoice becomes paid
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Issues a compiled draft under `invoice_number`
    pub fn from_draft(invoice_number: impl Into<String>, draft: InvoiceDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: InvoiceId::new_v7(),
            invoice_number: invoice_number.into(),
            contract_id: draft.contract_id,
            contract_number: draft.contract_number,
            client_name: draft.client_name,
            invoice_date: draft.invoice_date,
            due_date: draft.due_date,
            currency: draft.currency,
            line_items: draft.line_items,
            subtotal: draft.subtotal,
            tax_rate: draft.tax_rate,
            tax_amount: draft.tax_amount,
            total_amount: draft.total_amount,
            projection: draft.projection,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            paid_at: None,
            notes: draft.notes,
            created_at,
            updated_at: created_at,
        }
    }

    /// Moves the payment status along the state machine
    ///
    /// Setting the current status again is a no-op apart from recording the
    /// method.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidTransition` for a move the machine forbids
    pub fn update_payment_status(
        &mut self,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        if status != self.payment_status && !self.payment_status.can_transition_to(status) {
            return Err(BillingError::InvalidTransition {
                from: self.payment_status.as_str(),
                to: status.as_str(),
            });
        }

        if status == PaymentStatus::Paid && self.payment_status != PaymentStatus::Paid {
            self.paid_at = Some(now);
        }
        if method.is_some() {
            self.payment_method = method;
        }
        self.payment_status = status;
        self.updated_at = now;
        Ok(())
    }

    /// Moves a pending invoice past its due date to overdue
    ///
    /// Returns true if the status changed.
    pub fn mark_overdue_if_due(&mut self, today: NaiveDate, now: DateTime<Utc>) -> bool {
        if self.payment_status == PaymentStatus::Pending && today > self.due_date {
            self.payment_status = PaymentStatus::Overdue;
            self.updated_at = now;
            return true;
        }
        false
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        today > self.due_date && !self.payment_status.is_terminal()
    }

    /// Lines of one kind
    pub fn lines(&self, kind: LineItemKind) -> impl Iterator<Item = &InvoiceLineItem> {
        self.line_items.iter().filter(move |l| l.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_amount_is_rounded_product() {
        let line = InvoiceLineItem::new(LineItemKind::KmOverage, "Extra km", dec!(133), Money::usd(dec!(0.125)));
        assert_eq!(line.amount.amount(), dec!(16.63));
    }

    #[test]
    fn test_invoice_numbers() {
        assert_eq!(format_invoice_number(42), "INV-00042");
        assert_eq!(parse_invoice_sequence("INV-00042"), Some(42));
        assert_eq!(parse_invoice_sequence("CTR-001"), None);
    }
}
