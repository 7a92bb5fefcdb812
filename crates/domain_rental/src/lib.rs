//! Rental Domain
//!
//! The contract lifecycle and its money: pricing, booking-conflict detection,
//! renewal, return settlement and amendments.
//!
//! # Lifecycle
//!
//! A contract is `active` until its end date passes, then `overdue`, and
//! `completed` once the vehicle is returned. The stored status may be left
//! empty for derivation or set explicitly; see [`resolve_status`].
//!
//! # Calculator
//!
//! The pure functions in [`pricing`], [`settlement`] and [`amendment`] compute
//! figures; the `apply_*` methods on [`RentalContract`] commit them to the
//! aggregate. [`RentalService`] runs both against the ports inside an
//! optimistic retry loop.
//!
//! # Conflicts
//!
//! [`find_conflicts`] reports overlapping bookings on a vehicle. The report is
//! returned to the caller and never blocks a booking.

pub mod contract;
pub mod status;
pub mod conflict;
pub mod pricing;
pub mod settlement;
pub mod damage;
pub mod amendment;
pub mod events;
pub mod ports;
pub mod services;
pub mod error;

pub use contract::{
    ClientDetails, ContractDraft, ContractRecord, ContractStatus, FuelLevel, RentalContract,
    StatusMarker, format_contract_number, parse_contract_sequence,
};
pub use status::resolve_status;
pub use conflict::{ConflictReport, find_conflicts};
pub use pricing::{PricingQuote, RenewalQuote, price_rental, quote_renewal};
pub use settlement::{SettlementOutcome, SettlementPolicy, SettlementRequest, compute_settlement};
pub use damage::DamageMark;
pub use amendment::{AmendmentType, ContractAmendment, amend_rate, change_vehicle};
pub use events::ContractEvent;
pub use ports::{ContractChange, ContractPort, ContractQuery, VehicleStatusChange};
pub use services::{
    AmendmentResult, ContractOpening, DayCountMismatch, NewContract, RenewalOutcome, RentalConfig,
    RentalService, RetryPolicy, SettlementResult,
};
pub use error::RentalError;
