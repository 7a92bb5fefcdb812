//! Domain Adapters
//!
//! Adapter implementations for the domain ports, connecting them to the
//! PostgreSQL repositories.
//!
//! Each adapter:
//! - Implements the domain's port trait
//! - Translates between domain models and database row types
//! - Reports its health with a `SELECT 1` round trip
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresContractAdapter;
//! use domain_rental::ContractPort;
//!
//! let port: Arc<dyn ContractPort> = Arc::new(PostgresContractAdapter::new(pool));
//! let contract = port.get_by_number("CTR-001").await?;
//! ```

pub mod fleet;
pub mod rental;
pub mod billing;

pub use fleet::PostgresFleetAdapter;
pub use rental::PostgresContractAdapter;
pub use billing::PostgresInvoiceAdapter;

use std::str::FromStr;
use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, Currency, HealthCheckResult, Money};

use crate::error::DatabaseError;

/// Reads a stored currency code
pub(crate) fn currency(code: &str) -> Result<Currency, DatabaseError> {
    Currency::from_str(code).map_err(|_| DatabaseError::corrupt("currency", code))
}

pub(crate) fn money(amount: Decimal, currency: Currency) -> Money {
    Money::new(amount, currency)
}

/// Reads a stored enum string with the type's own parser
pub(crate) fn parse_column<T>(column: &str, value: &str, parse: fn(&str) -> Option<T>) -> Result<T, DatabaseError> {
    parse(value).ok_or_else(|| DatabaseError::corrupt(column, value))
}

/// Runs `SELECT 1` against the pool and reports the outcome
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        },
        Err(e) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(format!("Database error: {}", e)),
            checked_at: Utc::now(),
        },
    }
}
