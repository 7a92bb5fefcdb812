//! Core Kernel - Foundational types for the rental engine
//!
//! This crate provides the building blocks shared by every domain crate:
//! - Money with precise decimal arithmetic and half-up rounding helpers
//! - Rental periods (half-open) and reporting windows (inclusive dates)
//! - Typed identifiers
//! - An injectable clock
//! - The port error type used by all persistence adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod clock;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate, round0, round2};
pub use temporal::{RentalPeriod, DateRange, Timezone, TemporalError, ceil_days};
pub use identifiers::{
    VehicleId, MaintenanceRecordId, ClientId, ContractId, DamageMarkId,
    AmendmentId, InvoiceId, LineItemId,
};
pub use clock::{Clock, SystemClock, FixedClock};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
