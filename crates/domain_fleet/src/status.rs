//! Vehicle status derivation
//!
//! The stored status is a cache of facts held elsewhere: an open contract
//! means the car is out, an open garage visit means it is in the workshop.

use crate::vehicle::VehicleStatus;

/// Derives the status a vehicle should carry
///
/// `OutOfService` is operator-set and never overwritten. Otherwise an open
/// (not completed) contract wins over an open maintenance visit.
pub fn derive_vehicle_status(
    current: VehicleStatus,
    has_open_contract: bool,
    has_open_maintenance: bool,
) -> VehicleStatus {
    if current == VehicleStatus::OutOfService {
        return current;
    }
    if has_open_contract {
        VehicleStatus::Rented
    } else if has_open_maintenance {
        VehicleStatus::Maintenance
    } else {
        VehicleStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_table() {
        use VehicleStatus::*;
        assert_eq!(derive_vehicle_status(Available, true, true), Rented);
        assert_eq!(derive_vehicle_status(Rented, false, true), Maintenance);
        assert_eq!(derive_vehicle_status(Maintenance, false, false), Available);
        assert_eq!(derive_vehicle_status(OutOfService, true, false), OutOfService);
    }
}
