//! Billing domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{MoneyError, PortError};
use domain_rental::RentalError;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Payment status change not allowed from the current state
    #[error("Invalid payment status transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Compiled lines do not add up to the contract's figures
    #[error("Invoice totals do not reconcile: expected {expected}, lines sum to {actual}")]
    Unreconciled {
        expected: Decimal,
        actual: Decimal,
    },

    /// Input rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Financial error: {0}")]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Rental(#[from] RentalError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        match self {
            BillingError::Validation(_)
            | BillingError::InvalidTransition { .. }
            | BillingError::Unreconciled { .. }
            | BillingError::Money(_) => true,
            BillingError::Rental(e) => e.is_validation(),
            BillingError::Port(PortError::Validation { .. }) => true,
            _ => false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        match self {
            BillingError::Rental(e) => e.is_conflict(),
            BillingError::Port(e) => e.is_conflict(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            BillingError::InvoiceNotFound(_) => true,
            BillingError::Rental(e) => e.is_not_found(),
            BillingError::Port(e) => e.is_not_found(),
            _ => false,
        }
    }
}
