//! Rental Contract Aggregate Root
//!
//! The contract is the consistency boundary for a single rental. Its money
//! fields are private and change only through the calculator operations
//! ([`apply_renewal`](RentalContract::apply_renewal),
//! [`apply_settlement`](RentalContract::apply_settlement), the amendment
//! functions), each of which leaves a fully consistent snapshot.
//!
//! # Invariants
//!
//! - `final_amount = max(0, total_amount - discount)`
//! - `return_km >= pickup_km` when both are recorded
//! - once `returned_at` is set the contract no longer changes
//! - `version` increases by one on every write

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClientId, ContractId, Currency, Money, MoneyError, RentalPeriod, VehicleId};

use crate::damage::DamageMark;
use crate::error::RentalError;
use crate::events::ContractEvent;
use crate::pricing::PricingQuote;
use crate::status::resolve_status;

/// Lifecycle state of a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Active,
    Completed,
    Overdue,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Completed => "completed",
            ContractStatus::Overdue => "overdue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ContractStatus::Active),
            "completed" => Some(ContractStatus::Completed),
            "overdue" => Some(ContractStatus::Overdue),
            _ => None,
        }
    }
}

/// Stored status: either explicitly set, or left for derivation from dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMarker {
    Explicit(ContractStatus),
    Derive,
}

impl StatusMarker {
    /// Reads the nullable status column
    pub fn from_stored(stored: Option<ContractStatus>) -> Self {
        stored.map_or(StatusMarker::Derive, StatusMarker::Explicit)
    }

    /// Value for the nullable status column
    pub fn stored(&self) -> Option<ContractStatus> {
        match self {
            StatusMarker::Explicit(status) => Some(*status),
            StatusMarker::Derive => None,
        }
    }
}

/// Fuel gauge reading in quarter tanks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FuelLevel {
    Empty,
    #[serde(rename = "1/4")]
    Quarter,
    #[serde(rename = "1/2")]
    Half,
    #[serde(rename = "3/4")]
    ThreeQuarters,
    Full,
}

impl FuelLevel {
    pub fn quarters(&self) -> i32 {
        match self {
            FuelLevel::Empty => 0,
            FuelLevel::Quarter => 1,
            FuelLevel::Half => 2,
            FuelLevel::ThreeQuarters => 3,
            FuelLevel::Full => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelLevel::Empty => "Empty",
            FuelLevel::Quarter => "1/4",
            FuelLevel::Half => "1/2",
            FuelLevel::ThreeQuarters => "3/4",
            FuelLevel::Full => "Full",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Empty" => Some(FuelLevel::Empty),
            "1/4" => Some(FuelLevel::Quarter),
            "1/2" => Some(FuelLevel::Half),
            "3/4" => Some(FuelLevel::ThreeQuarters),
            "Full" => Some(FuelLevel::Full),
            _ => None,
        }
    }
}

/// Client fields copied onto the contract when it is opened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    pub client_id: Option<ClientId>,
    pub first_name: String,
    pub last_name: String,
    pub nationality: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub driving_license_number: Option<String>,
    pub license_issue_date: Option<NaiveDate>,
    pub license_expiry_date: Option<NaiveDate>,
}

impl ClientDetails {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Validated input for a new contract, before the store assigns its number
#[derive(Debug, Clone)]
pub struct ContractDraft {
    pub vehicle_id: VehicleId,
    pub client: ClientDetails,
    pub period: RentalPeriod,
    pub pricing: PricingQuote,
    pub pickup_km: Option<i64>,
    pub fuel_level: Option<FuelLevel>,
    pub km_limit: Option<i64>,
    pub damage_marks: Vec<DamageMark>,
    pub damage_inspection: Option<String>,
    pub opened_at: DateTime<Utc>,
}

/// Formats a contract sequence number as `CTR-001`
pub fn format_contract_number(sequence: i64) -> String {
    format!("CTR-{:03}", sequence)
}

/// Reads the sequence back out of a contract number
pub fn parse_contract_sequence(number: &str) -> Option<i64> {
    number.strip_prefix("CTR-")?.parse().ok()
}

/// The rental contract aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalContract {
    pub(crate) id: ContractId,
    pub(crate) contract_number: String,
    pub(crate) vehicle_id: VehicleId,
    pub(crate) client: ClientDetails,
    pub(crate) period: RentalPeriod,
    pub(crate) rental_days: u32,
    pub(crate) daily_rate: Money,
    pub(crate) total_amount: Money,
    pub(crate) discount: Money,
    pub(crate) final_amount: Money,
    pub(crate) status: StatusMarker,
    pub(crate) pickup_km: Option<i64>,
    pub(crate) return_km: Option<i64>,
    pub(crate) fuel_level: Option<FuelLevel>,
    pub(crate) return_fuel_level: Option<FuelLevel>,
    pub(crate) km_limit: Option<i64>,
    pub(crate) over_limit_km_rate: Option<Money>,
    pub(crate) over_limit_km_fee: Money,
    pub(crate) late_fee: Money,
    pub(crate) returned_at: Option<DateTime<Utc>>,
    pub(crate) damage_inspection: Option<String>,
    pub(crate) return_notes: Option<String>,
    pub(crate) damage_marks: Vec<DamageMark>,
    pub(crate) version: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) events: Vec<ContractEvent>,
}

impl RentalContract {
    /// Opens a contract from a draft once the store has assigned its number
    ///
    /// Stores call this inside the creating transaction; the status is left
    /// for derivation.
    pub fn from_draft(contract_number: impl Into<String>, draft: ContractDraft) -> Self {
        let created_at = draft.opened_at;
        let pricing = draft.pricing;
        let currency = pricing.daily_rate.currency();
        let mut contract = Self {
            id: ContractId::new_v7(),
            contract_number: contract_number.into(),
            vehicle_id: draft.vehicle_id,
            client: draft.client,
            period: draft.period,
            rental_days: pricing.rental_days,
            daily_rate: pricing.daily_rate,
            total_amount: pricing.total_amount,
            discount: pricing.discount,
            final_amount: pricing.final_amount,
            status: StatusMarker::Derive,
            pickup_km: draft.pickup_km,
            return_km: None,
            fuel_level: draft.fuel_level,
            return_fuel_level: None,
            km_limit: draft.km_limit,
            over_limit_km_rate: None,
            over_limit_km_fee: Money::zero(currency),
            late_fee: Money::zero(currency),
            returned_at: None,
            damage_inspection: draft.damage_inspection,
            return_notes: None,
            damage_marks: draft.damage_marks,
            version: 1,
            created_at,
            updated_at: created_at,
            events: Vec::new(),
        };

        contract.events.push(ContractEvent::ContractOpened {
            contract_id: contract.id,
            contract_number: contract.contract_number.clone(),
            vehicle_id: contract.vehicle_id,
            final_amount: contract.final_amount.amount(),
            timestamp: created_at,
        });
        contract
    }

    // Accessors

    pub fn id(&self) -> ContractId {
        self.id
    }

    pub fn contract_number(&self) -> &str {
        &self.contract_number
    }

    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    pub fn client(&self) -> &ClientDetails {
        &self.client
    }

    pub fn period(&self) -> &RentalPeriod {
        &self.period
    }

    pub fn rental_start(&self) -> DateTime<Utc> {
        self.period.start()
    }

    pub fn rental_end(&self) -> DateTime<Utc> {
        self.period.end()
    }

    pub fn rental_days(&self) -> u32 {
        self.rental_days
    }

    pub fn daily_rate(&self) -> Money {
        self.daily_rate
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn final_amount(&self) -> Money {
        self.final_amount
    }

    pub fn status_marker(&self) -> StatusMarker {
        self.status
    }

    pub fn pickup_km(&self) -> Option<i64> {
        self.pickup_km
    }

    pub fn return_km(&self) -> Option<i64> {
        self.return_km
    }

    pub fn fuel_level(&self) -> Option<FuelLevel> {
        self.fuel_level
    }

    pub fn return_fuel_level(&self) -> Option<FuelLevel> {
        self.return_fuel_level
    }

    pub fn km_limit(&self) -> Option<i64> {
        self.km_limit
    }

    /// Per-km rate in force when the contract was settled
    pub fn over_limit_km_rate(&self) -> Option<Money> {
        self.over_limit_km_rate
    }

    pub fn over_limit_km_fee(&self) -> Money {
        self.over_limit_km_fee
    }

    pub fn late_fee(&self) -> Money {
        self.late_fee
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn damage_inspection(&self) -> Option<&str> {
        self.damage_inspection.as_deref()
    }

    pub fn return_notes(&self) -> Option<&str> {
        self.return_notes.as_deref()
    }

    pub fn damage_marks(&self) -> &[DamageMark] {
        &self.damage_marks
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn currency(&self) -> Currency {
        self.daily_rate.currency()
    }

    // Derived figures

    /// Effective lifecycle state at `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> ContractStatus {
        resolve_status(self.status, &self.period, self.returned_at, now)
    }

    /// Completed no matter what the clock says
    pub fn is_completed(&self) -> bool {
        self.returned_at.is_some() || self.status == StatusMarker::Explicit(ContractStatus::Completed)
    }

    /// Kilometres driven, once both odometer readings exist
    pub fn km_driven(&self) -> Option<i64> {
        Some(self.return_km? - self.pickup_km?)
    }

    /// Kilometres beyond the limit, zero without a limit or readings
    pub fn overage_km(&self) -> i64 {
        match (self.km_driven(), self.km_limit) {
            (Some(driven), Some(limit)) => (driven - limit).max(0),
            _ => 0,
        }
    }

    /// Whole days past the agreed end at which the car came back
    pub fn days_late(&self) -> i64 {
        self.returned_at
            .map_or(0, |returned| core_kernel::ceil_days(returned - self.period.end()))
    }

    /// Calendar span of the booking, which may differ from `rental_days`
    pub fn calendar_days(&self) -> i64 {
        self.period.calendar_days()
    }

    /// Amount the client owes before tax: final amount plus settlement fees
    pub fn amount_due(&self) -> Result<Money, MoneyError> {
        self.final_amount
            .checked_add(&self.over_limit_km_fee)?
            .checked_add(&self.late_fee)
    }

    /// Drains recorded domain events
    pub fn take_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Sets or clears an operator status override
    ///
    /// Completion is reached only through settlement.
    pub fn override_status(&mut self, status: Option<ContractStatus>, now: DateTime<Utc>) -> Result<(), RentalError> {
        self.ensure_open()?;
        if status == Some(ContractStatus::Completed) {
            return Err(RentalError::validation(
                "a contract is completed by settling it, not by setting its status",
            ));
        }
        self.status = StatusMarker::from_stored(status);
        self.touch(now);
        self.events.push(ContractEvent::StatusOverridden {
            contract_id: self.id,
            status,
            timestamp: now,
        });
        Ok(())
    }

    pub(crate) fn ensure_open(&self) -> Result<(), RentalError> {
        if self.is_completed() {
            return Err(RentalError::validation(format!(
                "contract {} is completed and can no longer change",
                self.contract_number
            )));
        }
        Ok(())
    }

    /// Recomputes the final amount from total and discount
    pub(crate) fn recompute_final(&mut self) -> Result<(), RentalError> {
        self.final_amount = self.total_amount.checked_sub(&self.discount)?.floor_zero();
        Ok(())
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }

    /// Plain field snapshot for persistence adapters
    pub fn to_record(&self) -> ContractRecord {
        ContractRecord {
            id: self.id,
            contract_number: self.contract_number.clone(),
            vehicle_id: self.vehicle_id,
            client: self.client.clone(),
            rental_start: self.period.start(),
            rental_end: self.period.end(),
            rental_days: self.rental_days,
            daily_rate: self.daily_rate,
            total_amount: self.total_amount,
            discount: self.discount,
            final_amount: self.final_amount,
            status: self.status.stored(),
            pickup_km: self.pickup_km,
            return_km: self.return_km,
            fuel_level: self.fuel_level,
            return_fuel_level: self.return_fuel_level,
            km_limit: self.km_limit,
            over_limit_km_rate: self.over_limit_km_rate,
            over_limit_km_fee: self.over_limit_km_fee,
            late_fee: self.late_fee,
            returned_at: self.returned_at,
            damage_inspection: self.damage_inspection.clone(),
            return_notes: self.return_notes.clone(),
            damage_marks: self.damage_marks.clone(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Rebuilds a contract from a stored record
    ///
    /// # Errors
    ///
    /// Returns a validation error if the stored period is inverted
    pub fn from_record(record: ContractRecord) -> Result<Self, RentalError> {
        let period = RentalPeriod::new(record.rental_start, record.rental_end)?;
        Ok(Self {
            id: record.id,
            contract_number: record.contract_number,
            vehicle_id: record.vehicle_id,
            client: record.client,
            period,
            rental_days: record.rental_days,
            daily_rate: record.daily_rate,
            total_amount: record.total_amount,
            discount: record.discount,
            final_amount: record.final_amount,
            status: StatusMarker::from_stored(record.status),
            pickup_km: record.pickup_km,
            return_km: record.return_km,
            fuel_level: record.fuel_level,
            return_fuel_level: record.return_fuel_level,
            km_limit: record.km_limit,
            over_limit_km_rate: record.over_limit_km_rate,
            over_limit_km_fee: record.over_limit_km_fee,
            late_fee: record.late_fee,
            returned_at: record.returned_at,
            damage_inspection: record.damage_inspection,
            return_notes: record.return_notes,
            damage_marks: record.damage_marks,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
            events: Vec::new(),
        })
    }
}

/// Flat contract row used by persistence adapters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub id: ContractId,
    pub contract_number: String,
    pub vehicle_id: VehicleId,
    pub client: ClientDetails,
    pub rental_start: DateTime<Utc>,
    pub rental_end: DateTime<Utc>,
    pub rental_days: u32,
    pub daily_rate: Money,
    pub total_amount: Money,
    pub discount: Money,
    pub final_amount: Money,
    pub status: Option<ContractStatus>,
    pub pickup_km: Option<i64>,
    pub return_km: Option<i64>,
    pub fuel_level: Option<FuelLevel>,
    pub return_fuel_level: Option<FuelLevel>,
    pub km_limit: Option<i64>,
    pub over_limit_km_rate: Option<Money>,
    pub over_limit_km_fee: Money,
    pub late_fee: Money,
    pub returned_at: Option<DateTime<Utc>>,
    pub damage_inspection: Option<String>,
    pub return_notes: Option<String>,
    pub damage_marks: Vec<DamageMark>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
