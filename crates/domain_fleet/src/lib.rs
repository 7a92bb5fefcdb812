//! Fleet Domain
//!
//! Vehicles, their rate cards and odometer, workshop visits, and the
//! maintenance-due alerts raised from scheduled service dates and mileage.
//! Insurance policies run one year from their start date and are tracked for
//! upcoming and past expiry.
//!
//! # Rate tiers
//!
//! A vehicle carries a daily rate and optional weekly and monthly per-day
//! rates. [`Vehicle::rate_for`] picks the per-day rate for a booking length:
//!
//! | Rental days | Rate used                          |
//! |-------------|------------------------------------|
//! | 30 or more  | monthly, if set                    |
//! | 7 or more   | weekly, if set                     |
//! | otherwise   | daily                              |
//!
//! # Status
//!
//! `Available`, `Rented`, `Maintenance` and `Out of Service`. The rental
//! engine flips `Available`/`Rented` inside the same transaction as the
//! contract write; [`derive_vehicle_status`] rebuilds the status from open
//! contracts and open garage visits.

pub mod vehicle;
pub mod maintenance;
pub mod alerts;
pub mod insurance;
pub mod status;
pub mod ports;
pub mod services;
pub mod error;

pub use vehicle::{Vehicle, VehicleStatus, RateTier, TieredRate};
pub use maintenance::{MaintenanceRecord, MaintenanceType};
pub use alerts::{AlertThresholds, DueType, MaintenanceAlert, maintenance_alerts};
pub use insurance::{
    expired_insurance, expiring_insurance, insurance_status, InsuranceAlert, InsurancePolicy, InsuranceRenewal,
    InsuranceStatus, DEFAULT_EXPIRY_THRESHOLD_DAYS,
};
pub use status::derive_vehicle_status;
pub use ports::{FleetPort, MaintenanceQuery};
pub use services::FleetService;
pub use error::FleetError;
