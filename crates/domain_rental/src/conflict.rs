//! Booking conflict detection
//!
//! Overlap is advisory. Callers receive the report beside the created or
//! renewed contract and decide what to do with it; nothing here blocks a
//! booking.

use serde::{Deserialize, Serialize};

use core_kernel::{ContractId, RentalPeriod, VehicleId};

use crate::contract::RentalContract;

/// Contracts on a vehicle that overlap a candidate window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    pub vehicle_id: VehicleId,
    pub candidate: RentalPeriod,
    pub conflicts: Vec<RentalContract>,
    pub count: usize,
}

impl ConflictReport {
    pub fn has_conflicts(&self) -> bool {
        self.count > 0
    }

    /// Contract numbers of the overlapping bookings
    pub fn contract_numbers(&self) -> Vec<&str> {
        self.conflicts.iter().map(RentalContract::contract_number).collect()
    }
}

/// Finds contracts for `vehicle_id` whose window overlaps `candidate`
///
/// Intervals are half-open, so a booking ending exactly when another begins
/// does not conflict. Completed contracts and `exclude` (the contract being
/// edited) are skipped. Contracts for other vehicles in `existing` are ignored.
pub fn find_conflicts(
    vehicle_id: VehicleId,
    candidate: &RentalPeriod,
    existing: &[RentalContract],
    exclude: Option<ContractId>,
) -> ConflictReport {
    let conflicts: Vec<RentalContract> = existing
        .iter()
        .filter(|c| c.vehicle_id() == vehicle_id)
        .filter(|c| Some(c.id()) != exclude)
        .filter(|c| !c.is_completed())
        .filter(|c| c.period().overlaps(candidate))
        .cloned()
        .collect();

    ConflictReport {
        vehicle_id,
        candidate: *candidate,
        count: conflicts.len(),
        conflicts,
    }
}
