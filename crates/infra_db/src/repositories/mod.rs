//! Repository implementations
//!
//! Repositories own the SQL. They speak in plain row types; conversion to and
//! from domain types happens in [`crate::adapters`].
//!
//! Each repository follows these principles:
//! - Multi-row writes run in one serializable transaction
//! - Human-facing numbers come from the `number_counters` table
//! - Contract updates are guarded by a version compare-and-swap

pub mod fleet;
pub mod contracts;
pub mod invoices;

pub use fleet::{FleetRepository, MaintenanceRow, VehicleRow};
pub use contracts::{
    AmendmentRow, ContractRepository, ContractRow, ContractWithMarks, DamageMarkRow, VehicleUpdateRow,
};
pub use invoices::{InvoiceRepository, InvoiceRow, InvoiceWithLines, LineItemRow};
