//! Ports and Adapters Infrastructure
//!
//! Every domain crate defines its persistence needs as an async port trait
//! (`FleetPort`, `ContractPort`, `InvoicePort`). Adapters live elsewhere:
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │          Services (RentalService, InvoiceService)  │
//! └────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌────────────────────────────────────────────────────┐
//! │   Port traits, defined per domain on core_kernel   │
//! └────────────────────────────────────────────────────┘
//!              ▲                          ▲
//!   ┌──────────┴─────────┐     ┌──────────┴─────────┐
//!   │ PostgreSQL adapter │     │  In-memory adapter │
//!   │     (infra_db)     │     │    (test_utils)    │
//!   └────────────────────┘     └────────────────────┘
//! ```
//!
//! All adapters report failures through [`PortError`] so services can tell a
//! lost optimistic race (`Conflict`, retried) from a missing row or a broken
//! connection.

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Error type for port operations
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A validation error occurred in the store (check constraint, bad data)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The write lost a race: version mismatch, serialization failure or a
    /// number collision
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if the write lost an optimistic concurrency race
    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Marker trait for all domain ports
///
/// Ports are shared behind `Arc<dyn ...>` across request tasks.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("RentalContract", "RCT-123");
        assert!(error.is_not_found());
        assert!(!error.is_conflict());
        assert!(error.to_string().contains("RentalContract"));
        assert!(error.to_string().contains("RCT-123"));
    }

    #[test]
    fn test_port_error_conflict() {
        let conflict = PortError::conflict("version 3 expected, found 4");
        assert!(conflict.is_conflict());
        assert!(!conflict.is_not_found());

        let timeout = PortError::Timeout {
            operation: "save_contract".to_string(),
            duration_ms: 5000,
        };
        assert!(!timeout.is_conflict());
    }
}
