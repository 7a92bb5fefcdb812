//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the rental engine using SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] hold the SQL and speak in row types
//! - [`adapters`] implement the domain ports (`FleetPort`, `ContractPort`,
//!   `InvoicePort`) on top of the repositories
//! - [`pool`] builds the connection pool and runs the embedded migrations
//!
//! # Consistency
//!
//! Contract creation, contract updates and invoice issuance each run in one
//! serializable transaction together with the vehicle status flip or the
//! number counter they depend on. A transaction that loses a race surfaces as
//! `PortError::Conflict`, which the rental service retries.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool_from_url, run_migrations, PostgresContractAdapter};
//!
//! let pool = create_pool_from_url("postgres://localhost/rental").await?;
//! run_migrations(&pool).await?;
//! let contracts = PostgresContractAdapter::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PostgresContractAdapter, PostgresFleetAdapter, PostgresInvoiceAdapter};
