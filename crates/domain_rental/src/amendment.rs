//! Contract amendments
//!
//! Rate adjustments and vehicle swaps on an open contract. Each produces an
//! append-only [`ContractAmendment`] holding the before and after values.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use core_kernel::{AmendmentId, ContractId, Money};
use domain_fleet::{Vehicle, VehicleStatus};

use crate::contract::RentalContract;
use crate::error::RentalError;
use crate::events::ContractEvent;
use crate::pricing::check_amount;

/// Kind of amendment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmendmentType {
    RateAdjustment,
    VehicleChange,
}

impl AmendmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmendmentType::RateAdjustment => "rate_adjustment",
            AmendmentType::VehicleChange => "vehicle_change",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rate_adjustment" => Some(AmendmentType::RateAdjustment),
            "vehicle_change" => Some(AmendmentType::VehicleChange),
            _ => None,
        }
    }
}

/// Audit record of a change to an open contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractAmendment {
    pub id: AmendmentId,
    pub contract_id: ContractId,
    pub amendment_type: AmendmentType,
    pub reason: String,
    pub previous_values: Value,
    pub new_values: Value,
    /// Change in final amount, negative when the client pays less
    pub amount_difference: Decimal,
    pub created_at: DateTime<Utc>,
}

fn require_reason(reason: &str) -> Result<(), RentalError> {
    if reason.trim().is_empty() {
        return Err(RentalError::validation("an amendment needs a reason"));
    }
    Ok(())
}

/// Changes the daily rate and reprices the whole booking
///
/// `total_amount` becomes `round2(new_rate × rental_days)`.
///
/// # Errors
///
/// Returns `RentalError::Validation` on a completed contract, a negative or
/// sub-cent rate, a blank reason, or a new total below the existing discount
pub fn amend_rate(
    contract: &mut RentalContract,
    new_rate: Money,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<ContractAmendment, RentalError> {
    contract.ensure_open()?;
    require_reason(reason)?;
    check_amount("daily rate", &new_rate)?;

    let new_total = new_rate
        .multiply(Decimal::from(contract.rental_days))
        .round2();
    if new_total.checked_sub(&contract.discount)?.is_negative() {
        return Err(RentalError::validation(format!(
            "new total {} falls below the discount {}",
            new_total, contract.discount
        )));
    }

    let previous_rate = contract.daily_rate;
    let previous_total = contract.total_amount;
    let previous_final = contract.final_amount;

    contract.daily_rate = new_rate;
    contract.total_amount = new_total;
    contract.recompute_final()?;
    contract.touch(now);

    let amount_difference = contract.final_amount.checked_sub(&previous_final)?.amount();
    contract.events.push(ContractEvent::RateAmended {
        contract_id: contract.id,
        previous_rate: previous_rate.amount(),
        new_rate: new_rate.amount(),
        amount_difference,
        timestamp: now,
    });

    Ok(ContractAmendment {
        id: AmendmentId::new_v7(),
        contract_id: contract.id,
        amendment_type: AmendmentType::RateAdjustment,
        reason: reason.to_string(),
        previous_values: json!({
            "daily_rate": previous_rate.amount(),
            "total_amount": previous_total.amount(),
            "final_amount": previous_final.amount(),
        }),
        new_values: json!({
            "daily_rate": new_rate.amount(),
            "total_amount": contract.total_amount.amount(),
            "final_amount": contract.final_amount.amount(),
        }),
        amount_difference,
        created_at: now,
    })
}

/// Moves the contract to another vehicle, keeping its price
///
/// # Errors
///
/// Returns `RentalError::Validation` on a completed contract, a blank reason,
/// the same vehicle, or a replacement that is not `Available`
pub fn change_vehicle(
    contract: &mut RentalContract,
    current: &Vehicle,
    replacement: &Vehicle,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<ContractAmendment, RentalError> {
    contract.ensure_open()?;
    require_reason(reason)?;
    if replacement.id == contract.vehicle_id {
        return Err(RentalError::validation("contract is already on this vehicle"));
    }
    if replacement.status != VehicleStatus::Available {
        return Err(RentalError::validation(format!(
            "vehicle {} is {}, not Available",
            replacement.plate_number,
            replacement.status.as_str()
        )));
    }

    let previous_vehicle_id = contract.vehicle_id;
    contract.vehicle_id = replacement.id;
    contract.touch(now);

    contract.events.push(ContractEvent::VehicleChanged {
        contract_id: contract.id,
        previous_vehicle_id,
        new_vehicle_id: replacement.id,
        timestamp: now,
    });

    Ok(ContractAmendment {
        id: AmendmentId::new_v7(),
        contract_id: contract.id,
        amendment_type: AmendmentType::VehicleChange,
        reason: reason.to_string(),
        previous_values: json!({
            "vehicle_id": previous_vehicle_id.to_string(),
            "plate_number": current.plate_number,
        }),
        new_values: json!({
            "vehicle_id": replacement.id.to_string(),
            "plate_number": replacement.plate_number,
        }),
        amount_difference: Decimal::ZERO,
        created_at: now,
    })
}
