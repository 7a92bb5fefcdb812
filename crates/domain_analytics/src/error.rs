//! Analytics domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError, TemporalError};

/// Errors that can occur while building reports
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Report parameters rejected
    #[error("Validation error: {0}")]
    Validation(String),

    /// The scoped vehicle does not exist
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("Invalid report window: {0}")]
    Temporal(#[from] TemporalError),

    #[error("Financial error: {0}")]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl AnalyticsError {
    pub fn validation(message: impl Into<String>) -> Self {
        AnalyticsError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AnalyticsError::Validation(_) | AnalyticsError::Temporal(_) | AnalyticsError::Money(_)
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, AnalyticsError::Port(e) if e.is_conflict())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            AnalyticsError::VehicleNotFound(_) => true,
            AnalyticsError::Port(e) => e.is_not_found(),
            _ => false,
        }
    }
}
