//! Rental domain services
//!
//! [`RentalService`] orchestrates the contract lifecycle over the ports:
//! it reads, runs the pure calculators, and commits. Writes on an existing
//! contract are optimistic; a lost version race re-runs the whole
//! read-compute-write cycle up to the configured number of attempts.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use core_kernel::{Clock, ContractId, Money, RentalPeriod, VehicleId};
use domain_fleet::{
    derive_vehicle_status, FleetError, FleetPort, MaintenanceQuery, MaintenanceRecord, RateTier,
    Vehicle, VehicleStatus,
};

use crate::amendment::{self, ContractAmendment};
use crate::conflict::{find_conflicts, ConflictReport};
use crate::contract::{ClientDetails, ContractDraft, ContractStatus, FuelLevel, RentalContract};
use crate::damage::DamageMark;
use crate::error::RentalError;
use crate::events::ContractEvent;
use crate::ports::{ContractChange, ContractPort, ContractQuery, VehicleStatusChange};
use crate::pricing::{price_rental, quote_renewal, RenewalQuote};
use crate::settlement::{compute_settlement, SettlementOutcome, SettlementPolicy, SettlementRequest};

/// Bound on optimistic retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Rental service configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalConfig {
    #[serde(default)]
    pub settlement: SettlementPolicy,
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Request to open a contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContract {
    pub vehicle_id: VehicleId,
    pub client: ClientDetails,
    pub rental_start: DateTime<Utc>,
    pub rental_end: DateTime<Utc>,
    pub rental_days: u32,
    /// Overrides the vehicle's tiered rate
    pub daily_rate: Option<Money>,
    pub discount: Option<Money>,
    /// Defaults to the vehicle's current odometer
    pub pickup_km: Option<i64>,
    pub fuel_level: Option<FuelLevel>,
    pub km_limit: Option<i64>,
    #[serde(default)]
    pub damage_marks: Vec<DamageMark>,
    pub damage_inspection: Option<String>,
}

/// Declared rental days differ from the calendar span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCountMismatch {
    pub declared: u32,
    pub calendar: i64,
}

/// Result of opening a contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractOpening {
    pub contract: RentalContract,
    /// Tier used, `None` when the rate was overridden
    pub rate_tier: Option<RateTier>,
    pub conflicts: ConflictReport,
    pub day_count_mismatch: Option<DayCountMismatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewalOutcome {
    pub contract: RentalContract,
    pub quote: RenewalQuote,
    pub conflicts: ConflictReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResult {
    pub contract: RentalContract,
    pub outcome: SettlementOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentResult {
    pub contract: RentalContract,
    pub amendment: ContractAmendment,
    /// Bookings already holding the replacement vehicle, for vehicle changes
    pub conflicts: Option<ConflictReport>,
}

/// Service for the contract lifecycle
pub struct RentalService {
    contracts: Arc<dyn ContractPort>,
    fleet: Arc<dyn FleetPort>,
    clock: Arc<dyn Clock>,
    config: RentalConfig,
}

impl RentalService {
    pub fn new(contracts: Arc<dyn ContractPort>, fleet: Arc<dyn FleetPort>, clock: Arc<dyn Clock>) -> Self {
        Self {
            contracts,
            fleet,
            clock,
            config: RentalConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RentalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RentalConfig {
        &self.config
    }

    /// Lists bookings on a vehicle that overlap `[start, end)`
    ///
    /// # Errors
    ///
    /// Validation if `end <= start`, not found if the vehicle is unknown
    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        vehicle_id: VehicleId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<ContractId>,
    ) -> Result<ConflictReport, RentalError> {
        let candidate = RentalPeriod::new(start, end)?;
        self.vehicle(vehicle_id).await?;
        let existing = self
            .contracts
            .list_contracts(ContractQuery::for_vehicle(vehicle_id))
            .await?;
        Ok(find_conflicts(vehicle_id, &candidate, &existing, exclude))
    }

    /// Opens a contract and hands the vehicle over
    ///
    /// Overlapping bookings and a day count that disagrees with the dates are
    /// reported in the result; neither stops the booking.
    #[instrument(skip(self, request), fields(vehicle_id = %request.vehicle_id))]
    pub async fn create_contract(&self, request: NewContract) -> Result<ContractOpening, RentalError> {
        let period = RentalPeriod::new(request.rental_start, request.rental_end)?;
        let vehicle = self.vehicle(request.vehicle_id).await?;

        let (daily_rate, rate_tier) = match request.daily_rate {
            Some(rate) => (rate, None),
            None => {
                let tiered = vehicle.rate_for(request.rental_days);
                (tiered.daily_rate, Some(tiered.tier))
            }
        };
        let discount = request
            .discount
            .unwrap_or_else(|| Money::zero(daily_rate.currency()));
        let pricing = price_rental(daily_rate, request.rental_days, discount)?;

        let existing = self
            .contracts
            .list_contracts(ContractQuery::for_vehicle(vehicle.id))
            .await?;
        let conflicts = find_conflicts(vehicle.id, &period, &existing, None);
        if conflicts.has_conflicts() {
            warn!(
                count = conflicts.count,
                contracts = ?conflicts.contract_numbers(),
                "Booking overlaps existing contracts"
            );
        }

        let calendar = period.calendar_days();
        let day_count_mismatch = (i64::from(request.rental_days) != calendar).then_some(DayCountMismatch {
            declared: request.rental_days,
            calendar,
        });

        let draft = ContractDraft {
            vehicle_id: vehicle.id,
            client: request.client,
            period,
            pricing,
            pickup_km: request.pickup_km.or(Some(vehicle.mileage)),
            fuel_level: request.fuel_level,
            km_limit: request.km_limit,
            damage_marks: request.damage_marks,
            damage_inspection: request.damage_inspection,
            opened_at: self.clock.now(),
        };

        let draft = &draft;
        let mut contract = self
            .with_retry("new contract", move || self.try_create(draft))
            .await?;
        log_events(contract.take_events());

        Ok(ContractOpening {
            contract,
            rate_tier,
            conflicts,
            day_count_mismatch,
        })
    }

    async fn try_create(&self, draft: &ContractDraft) -> Result<RentalContract, RentalError> {
        Ok(self.contracts.create_contract(draft.clone()).await?)
    }

    /// Extends an open contract by `additional_days` calendar days
    #[instrument(skip(self))]
    pub async fn renew_contract(&self, id: ContractId, additional_days: u32) -> Result<RenewalOutcome, RentalError> {
        self.with_retry(&id.to_string(), move || self.try_renew(id, additional_days))
            .await
    }

    async fn try_renew(&self, id: ContractId, additional_days: u32) -> Result<RenewalOutcome, RentalError> {
        let mut contract = self.load(id).await?;
        let expected_version = contract.version();

        let quote = quote_renewal(&contract, additional_days)?;
        let others = self
            .contracts
            .list_contracts(ContractQuery::for_vehicle(contract.vehicle_id()))
            .await?;
        let conflicts = find_conflicts(contract.vehicle_id(), &quote.extension, &others, Some(id));

        contract.apply_renewal(&quote, self.clock.now())?;
        let events = contract.take_events();
        self.contracts
            .commit(ContractChange::new(contract.clone(), expected_version))
            .await?;
        log_events(events);

        Ok(RenewalOutcome {
            contract,
            quote,
            conflicts,
        })
    }

    /// Records the vehicle's return and fixes the settlement fees
    ///
    /// The vehicle goes back to `Available` and its odometer advances to the
    /// return reading in the same commit.
    #[instrument(skip(self, request), fields(return_km = request.return_km))]
    pub async fn settle_contract(
        &self,
        id: ContractId,
        request: SettlementRequest,
    ) -> Result<SettlementResult, RentalError> {
        let request = &request;
        self.with_retry(&id.to_string(), move || self.try_settle(id, request))
            .await
    }

    async fn try_settle(&self, id: ContractId, request: &SettlementRequest) -> Result<SettlementResult, RentalError> {
        let mut contract = self.load(id).await?;
        let expected_version = contract.version();

        let outcome = compute_settlement(&contract, request, &self.config.settlement)?;
        contract.apply_settlement(request, &outcome, self.clock.now())?;
        let events = contract.take_events();

        let release = VehicleStatusChange::to(contract.vehicle_id(), VehicleStatus::Available)
            .with_mileage(request.return_km);
        self.contracts
            .commit(ContractChange::new(contract.clone(), expected_version).with_vehicle_update(release))
            .await?;
        log_events(events);

        info!(
            contract = contract.contract_number(),
            days_late = outcome.days_late,
            overage_km = outcome.overage_km,
            "Contract settled"
        );
        Ok(SettlementResult { contract, outcome })
    }

    /// Reprices an open contract at a new daily rate
    #[instrument(skip(self, reason))]
    pub async fn amend_rate(&self, id: ContractId, new_rate: Money, reason: String) -> Result<AmendmentResult, RentalError> {
        let reason = reason.as_str();
        self.with_retry(&id.to_string(), move || self.try_amend_rate(id, new_rate, reason))
            .await
    }

    async fn try_amend_rate(&self, id: ContractId, new_rate: Money, reason: &str) -> Result<AmendmentResult, RentalError> {
        let mut contract = self.load(id).await?;
        let expected_version = contract.version();

        let amendment = amendment::amend_rate(&mut contract, new_rate, reason, self.clock.now())?;
        let events = contract.take_events();
        self.contracts
            .commit(ContractChange::new(contract.clone(), expected_version).with_amendment(amendment.clone()))
            .await?;
        log_events(events);

        Ok(AmendmentResult {
            contract,
            amendment,
            conflicts: None,
        })
    }

    /// Moves an open contract onto another available vehicle
    ///
    /// The old vehicle is released and the new one marked `Rented` in the
    /// same commit as the contract.
    #[instrument(skip(self, reason))]
    pub async fn change_vehicle(
        &self,
        id: ContractId,
        new_vehicle_id: VehicleId,
        reason: String,
    ) -> Result<AmendmentResult, RentalError> {
        let reason = reason.as_str();
        self.with_retry(&id.to_string(), move || self.try_change_vehicle(id, new_vehicle_id, reason))
            .await
    }

    async fn try_change_vehicle(
        &self,
        id: ContractId,
        new_vehicle_id: VehicleId,
        reason: &str,
    ) -> Result<AmendmentResult, RentalError> {
        let mut contract = self.load(id).await?;
        let expected_version = contract.version();
        let current = self.vehicle(contract.vehicle_id()).await?;
        let replacement = self.vehicle(new_vehicle_id).await?;

        let others = self
            .contracts
            .list_contracts(ContractQuery::for_vehicle(new_vehicle_id))
            .await?;
        let conflicts = find_conflicts(new_vehicle_id, contract.period(), &others, Some(id));

        let amendment =
            amendment::change_vehicle(&mut contract, &current, &replacement, reason, self.clock.now())?;
        let events = contract.take_events();
        let change = ContractChange::new(contract.clone(), expected_version)
            .with_vehicle_update(VehicleStatusChange::to(current.id, VehicleStatus::Available))
            .with_vehicle_update(VehicleStatusChange::to(replacement.id, VehicleStatus::Rented))
            .with_amendment(amendment.clone());
        self.contracts.commit(change).await?;
        log_events(events);

        Ok(AmendmentResult {
            contract,
            amendment,
            conflicts: Some(conflicts),
        })
    }

    /// Sets or clears an operator status override on an open contract
    #[instrument(skip(self))]
    pub async fn override_status(
        &self,
        id: ContractId,
        status: Option<ContractStatus>,
    ) -> Result<RentalContract, RentalError> {
        self.with_retry(&id.to_string(), move || self.try_override_status(id, status))
            .await
    }

    async fn try_override_status(
        &self,
        id: ContractId,
        status: Option<ContractStatus>,
    ) -> Result<RentalContract, RentalError> {
        let mut contract = self.load(id).await?;
        let expected_version = contract.version();
        contract.override_status(status, self.clock.now())?;
        let events = contract.take_events();
        self.contracts
            .commit(ContractChange::new(contract.clone(), expected_version))
            .await?;
        log_events(events);
        Ok(contract)
    }

    pub async fn get_contract(&self, id: ContractId) -> Result<RentalContract, RentalError> {
        self.load(id).await
    }

    pub async fn get_by_number(&self, contract_number: &str) -> Result<RentalContract, RentalError> {
        self.contracts
            .get_by_number(contract_number)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    RentalError::contract_not_found(contract_number)
                } else {
                    e.into()
                }
            })
    }

    pub async fn list_contracts(&self, query: ContractQuery) -> Result<Vec<RentalContract>, RentalError> {
        Ok(self.contracts.list_contracts(query).await?)
    }

    pub async fn list_amendments(&self, id: ContractId) -> Result<Vec<ContractAmendment>, RentalError> {
        self.load(id).await?;
        Ok(self.contracts.list_amendments(id).await?)
    }

    /// Effective status of `contract` on the service clock
    pub fn status_of(&self, contract: &RentalContract) -> ContractStatus {
        contract.status_at(self.clock.now())
    }

    /// Rebuilds a vehicle's stored status from its open contracts and
    /// garage visits, writing it back if it drifted
    #[instrument(skip(self))]
    pub async fn reconcile_vehicle_status(&self, vehicle_id: VehicleId) -> Result<VehicleStatus, RentalError> {
        let mut vehicle = self.vehicle(vehicle_id).await?;
        let has_open_contract = !self
            .contracts
            .list_contracts(ContractQuery::for_vehicle(vehicle_id).open_only())
            .await?
            .is_empty();
        let has_open_maintenance = self
            .fleet
            .list_maintenance(MaintenanceQuery::for_vehicle(vehicle_id))
            .await?
            .iter()
            .any(MaintenanceRecord::is_open);

        let derived = derive_vehicle_status(vehicle.status, has_open_contract, has_open_maintenance);
        if derived != vehicle.status {
            info!(
                from = vehicle.status.as_str(),
                to = derived.as_str(),
                "Vehicle status reconciled"
            );
            vehicle.set_status(derived, self.clock.now());
            self.fleet.update_vehicle(&vehicle).await?;
        }
        Ok(derived)
    }

    async fn load(&self, id: ContractId) -> Result<RentalContract, RentalError> {
        self.contracts.get_contract(id).await.map_err(|e| {
            if e.is_not_found() {
                RentalError::contract_not_found(id)
            } else {
                e.into()
            }
        })
    }

    async fn vehicle(&self, id: VehicleId) -> Result<Vehicle, RentalError> {
        self.fleet.get_vehicle(id).await.map_err(|e| {
            if e.is_not_found() {
                FleetError::VehicleNotFound(id.to_string()).into()
            } else {
                e.into()
            }
        })
    }

    async fn with_retry<T, F, Fut>(&self, subject: &str, mut operation: F) -> Result<T, RentalError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RentalError>>,
    {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Err(e) if e.is_conflict() && !matches!(e, RentalError::RetriesExhausted { .. }) => {
                    if attempt >= max_attempts {
                        warn!(subject, attempts = attempt, "Giving up after repeated write conflicts");
                        return Err(RentalError::RetriesExhausted {
                            contract: subject.to_string(),
                            attempts: attempt,
                        });
                    }
                    debug!(subject, attempt, error = %e, "Write conflict, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

fn log_events(events: Vec<ContractEvent>) {
    for event in events {
        info!(
            event_type = event.event_type(),
            contract_id = %event.contract_id(),
            "Contract event"
        );
    }
}
