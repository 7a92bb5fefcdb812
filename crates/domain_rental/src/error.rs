//! Rental domain errors
//!
//! Overlapping bookings are not errors; they come back as a
//! [`ConflictReport`](crate::conflict::ConflictReport) beside a successful result.

use thiserror::Error;

use core_kernel::{MoneyError, PortError, TemporalError};
use domain_fleet::FleetError;

/// Errors that can occur in the rental domain
#[derive(Debug, Error)]
pub enum RentalError {
    /// Input rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// Contract, or a vehicle it references, does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// Optimistic retries ran out
    #[error("Concurrent modification of contract {contract}: gave up after {attempts} attempts")]
    RetriesExhausted {
        contract: String,
        attempts: u32,
    },

    #[error("Invalid period: {0}")]
    Temporal(#[from] TemporalError),

    #[error("Financial error: {0}")]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl RentalError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        RentalError::Validation(message.into())
    }

    /// Creates a contract not found error
    pub fn contract_not_found(id: impl std::fmt::Display) -> Self {
        RentalError::NotFound {
            entity: "Contract",
            id: id.to_string(),
        }
    }

    /// Input errors: bad figures, bad dates, or a completed contract
    pub fn is_validation(&self) -> bool {
        match self {
            RentalError::Validation(_) | RentalError::Temporal(_) | RentalError::Money(_) => true,
            RentalError::Fleet(FleetError::Validation(_)) => true,
            RentalError::Port(PortError::Validation { .. }) => true,
            _ => false,
        }
    }

    /// A lost optimistic race, retried by the service before surfacing
    pub fn is_conflict(&self) -> bool {
        match self {
            RentalError::RetriesExhausted { .. } => true,
            RentalError::Port(e) => e.is_conflict(),
            RentalError::Fleet(FleetError::Port(e)) => e.is_conflict(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            RentalError::NotFound { .. } => true,
            RentalError::Fleet(e) => e.is_not_found(),
            RentalError::Port(e) => e.is_not_found(),
            _ => false,
        }
    }
}
