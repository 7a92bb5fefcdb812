//! Fleet domain errors

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur in the fleet domain
#[derive(Debug, Error)]
pub enum FleetError {
    /// Input rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// Vehicle not found
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    /// Persistence failure
    #[error(transparent)]
    Port(#[from] PortError),
}

impl FleetError {
    pub fn validation(message: impl Into<String>) -> Self {
        FleetError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        match self {
            FleetError::Validation(_) => true,
            FleetError::Port(PortError::Validation { .. }) => true,
            _ => false,
        }
    }

    /// Duplicate plate number or a lost write race
    pub fn is_conflict(&self) -> bool {
        matches!(self, FleetError::Port(e) if e.is_conflict())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            FleetError::VehicleNotFound(_) => true,
            FleetError::Port(e) => e.is_not_found(),
            _ => false,
        }
    }
}
