//! Return settlement
//!
//! Computes the fees owed when a vehicle comes back:
//!
//! - **KM overage**: `max(0, (return_km − pickup_km) − km_limit)` kilometres
//!   at the configured per-km rate. Without a rate, or without a pickup
//!   reading, the fee is zero and only the distance is reported.
//! - **Late fee**: one full daily rate for every started day past the agreed
//!   end. Not pro-rated, not capped.
//! - **Fuel**: the shortfall in quarter tanks is reported, never charged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ceil_days, Money};

use crate::contract::{ContractStatus, FuelLevel, RentalContract, StatusMarker};
use crate::error::RentalError;
use crate::events::ContractEvent;

/// Settlement parameters that come from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPolicy {
    /// Fee per kilometre beyond the contract's limit, in the contract currency
    pub per_km_overage_rate: Option<Decimal>,
}

/// What the operator records at return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub return_km: i64,
    pub return_fuel_level: Option<FuelLevel>,
    pub returned_at: DateTime<Utc>,
    pub return_notes: Option<String>,
    pub damage_inspection: Option<String>,
}

/// Computed settlement figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub km_driven: Option<i64>,
    pub overage_km: i64,
    pub per_km_rate: Option<Money>,
    pub over_limit_km_fee: Money,
    pub days_late: i64,
    pub late_fee: Money,
    /// Quarter tanks missing at return, if both readings exist
    pub fuel_shortfall_quarters: Option<i32>,
}

impl SettlementOutcome {
    pub fn total_fees(&self) -> Result<Money, RentalError> {
        Ok(self.over_limit_km_fee.checked_add(&self.late_fee)?)
    }
}

/// Computes settlement figures without touching the contract
///
/// # Errors
///
/// Returns `RentalError::Validation` if the contract is already completed, the
/// return odometer reads below pickup, or the return predates the rental start
pub fn compute_settlement(
    contract: &RentalContract,
    request: &SettlementRequest,
    policy: &SettlementPolicy,
) -> Result<SettlementOutcome, RentalError> {
    contract.ensure_open()?;

    if request.return_km < 0 {
        return Err(RentalError::validation("return km must not be negative"));
    }
    if let Some(pickup) = contract.pickup_km() {
        if request.return_km < pickup {
            return Err(RentalError::validation(format!(
                "return km {} is below pickup km {}",
                request.return_km, pickup
            )));
        }
    }
    if request.returned_at < contract.rental_start() {
        return Err(RentalError::validation("return time precedes the rental start"));
    }

    let currency = contract.currency();
    let km_driven = contract.pickup_km().map(|pickup| request.return_km - pickup);
    let overage_km = match (km_driven, contract.km_limit()) {
        (Some(driven), Some(limit)) => (driven - limit).max(0),
        _ => 0,
    };
    let per_km_rate = policy
        .per_km_overage_rate
        .map(|rate| Money::new(rate, currency));
    let over_limit_km_fee = match per_km_rate {
        Some(rate) if overage_km > 0 => rate.multiply(Decimal::from(overage_km)).round2(),
        _ => Money::zero(currency),
    };

    let days_late = ceil_days(request.returned_at - contract.rental_end());
    let late_fee = contract
        .daily_rate()
        .multiply(Decimal::from(days_late))
        .round2();

    let fuel_shortfall_quarters = match (contract.fuel_level(), request.return_fuel_level) {
        (Some(out), Some(back)) => Some((out.quarters() - back.quarters()).max(0)),
        _ => None,
    };

    Ok(SettlementOutcome {
        km_driven,
        overage_km,
        per_km_rate,
        over_limit_km_fee,
        days_late,
        late_fee,
        fuel_shortfall_quarters,
    })
}

impl RentalContract {
    /// Records the return and fixes the fees
    ///
    /// The contract becomes `completed` and no longer changes afterwards.
    pub fn apply_settlement(
        &mut self,
        request: &SettlementRequest,
        outcome: &SettlementOutcome,
        now: DateTime<Utc>,
    ) -> Result<(), RentalError> {
        self.ensure_open()?;

        self.return_km = Some(request.return_km);
        self.return_fuel_level = request.return_fuel_level;
        self.returned_at = Some(request.returned_at);
        self.return_notes = request.return_notes.clone();
        if request.damage_inspection.is_some() {
            self.damage_inspection = request.damage_inspection.clone();
        }
        self.over_limit_km_rate = outcome.per_km_rate;
        self.over_limit_km_fee = outcome.over_limit_km_fee;
        self.late_fee = outcome.late_fee;
        self.status = StatusMarker::Explicit(ContractStatus::Completed);
        self.touch(now);

        self.events.push(ContractEvent::ContractSettled {
            contract_id: self.id,
            returned_at: request.returned_at,
            over_limit_km_fee: outcome.over_limit_km_fee.amount(),
            late_fee: outcome.late_fee.amount(),
            timestamp: now,
        });
        Ok(())
    }
}
