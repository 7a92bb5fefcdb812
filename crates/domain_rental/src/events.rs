//! Domain events for the rental contract aggregate
//!
//! Events are collected on the contract and drained by the service after a
//! successful commit, where they are logged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ContractId, VehicleId};

use crate::contract::ContractStatus;

/// Domain events emitted by the RentalContract aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContractEvent {
    /// Contract opened and vehicle handed over
    ContractOpened {
        contract_id: ContractId,
        contract_number: String,
        vehicle_id: VehicleId,
        final_amount: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// Rental window extended
    ContractRenewed {
        contract_id: ContractId,
        additional_days: u32,
        additional_cost: Decimal,
        new_end: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// Vehicle returned and fees fixed
    ContractSettled {
        contract_id: ContractId,
        returned_at: DateTime<Utc>,
        over_limit_km_fee: Decimal,
        late_fee: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// Daily rate changed after opening
    RateAmended {
        contract_id: ContractId,
        previous_rate: Decimal,
        new_rate: Decimal,
        amount_difference: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// Customer moved to another vehicle
    VehicleChanged {
        contract_id: ContractId,
        previous_vehicle_id: VehicleId,
        new_vehicle_id: VehicleId,
        timestamp: DateTime<Utc>,
    },

    /// Operator set or cleared an explicit status
    StatusOverridden {
        contract_id: ContractId,
        status: Option<ContractStatus>,
        timestamp: DateTime<Utc>,
    },
}

impl ContractEvent {
    /// Returns the contract ID associated with this event
    pub fn contract_id(&self) -> ContractId {
        match self {
            ContractEvent::ContractOpened { contract_id, .. } => *contract_id,
            ContractEvent::ContractRenewed { contract_id, .. } => *contract_id,
            ContractEvent::ContractSettled { contract_id, .. } => *contract_id,
            ContractEvent::RateAmended { contract_id, .. } => *contract_id,
            ContractEvent::VehicleChanged { contract_id, .. } => *contract_id,
            ContractEvent::StatusOverridden { contract_id, .. } => *contract_id,
        }
    }

    /// Returns the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ContractEvent::ContractOpened { timestamp, .. } => *timestamp,
            ContractEvent::ContractRenewed { timestamp, .. } => *timestamp,
            ContractEvent::ContractSettled { timestamp, .. } => *timestamp,
            ContractEvent::RateAmended { timestamp, .. } => *timestamp,
            ContractEvent::VehicleChanged { timestamp, .. } => *timestamp,
            ContractEvent::StatusOverridden { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            ContractEvent::ContractOpened { .. } => "ContractOpened",
            ContractEvent::ContractRenewed { .. } => "ContractRenewed",
            ContractEvent::ContractSettled { .. } => "ContractSettled",
            ContractEvent::RateAmended { .. } => "RateAmended",
            ContractEvent::VehicleChanged { .. } => "VehicleChanged",
            ContractEvent::StatusOverridden { .. } => "StatusOverridden",
        }
    }
}
