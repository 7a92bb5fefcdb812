//! Contract DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ContractId, Money, VehicleId};
use domain_billing::Invoice;
use domain_fleet::RateTier;
use domain_rental::{
    ClientDetails, ConflictReport, ContractStatus, DamageMark, DayCountMismatch, FuelLevel, RenewalQuote,
    RentalContract, SettlementOutcome,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ClientRequest {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub nationality: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub driving_license_number: Option<String>,
    pub license_issue_date: Option<NaiveDate>,
    pub license_expiry_date: Option<NaiveDate>,
}

impl From<ClientRequest> for ClientDetails {
    fn from(request: ClientRequest) -> Self {
        ClientDetails {
            client_id: request.client_id.map(Into::into),
            first_name: request.first_name,
            last_name: request.last_name,
            nationality: request.nationality,
            phone: request.phone,
            address: request.address,
            driving_license_number: request.driving_license_number,
            license_issue_date: request.license_issue_date,
            license_expiry_date: request.license_expiry_date,
        }
    }
}

/// A damage mark on the vehicle diagram, in percent of width and height
#[derive(Debug, Deserialize, Validate)]
pub struct DamageMarkRequest {
    pub x: Decimal,
    pub y: Decimal,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateContractRequest {
    pub vehicle_id: Uuid,
    #[validate(nested)]
    pub client: ClientRequest,
    pub rental_start: DateTime<Utc>,
    pub rental_end: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub rental_days: u32,
    /// Overrides the vehicle's rate card
    pub daily_rate: Option<Decimal>,
    pub discount: Option<Decimal>,
    #[validate(range(min = 0))]
    pub pickup_km: Option<i64>,
    pub fuel_level: Option<FuelLevel>,
    #[validate(range(min = 0))]
    pub km_limit: Option<i64>,
    #[validate(nested)]
    #[serde(default)]
    pub damage_marks: Vec<DamageMarkRequest>,
    pub damage_inspection: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenewContractRequest {
    #[validate(range(min = 1, max = 365))]
    pub additional_days: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SettleContractRequest {
    #[validate(range(min = 0))]
    pub return_km: i64,
    pub return_fuel_level: Option<FuelLevel>,
    /// Defaults to the time of the request
    pub returned_at: Option<DateTime<Utc>>,
    pub return_notes: Option<String>,
    pub damage_inspection: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AmendRateRequest {
    pub daily_rate: Decimal,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeVehicleRequest {
    pub vehicle_id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// `null` clears the override and status goes back to derivation
#[derive(Debug, Deserialize, Validate)]
pub struct StatusOverrideRequest {
    pub status: Option<ContractStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContractListQuery {
    pub vehicle_id: Option<Uuid>,
    #[serde(default)]
    pub open_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub vehicle_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub exclude: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ContractResponse {
    pub id: ContractId,
    pub contract_number: String,
    pub vehicle_id: VehicleId,
    pub client: ClientDetails,
    pub status: ContractStatus,
    pub rental_start: DateTime<Utc>,
    pub rental_end: DateTime<Utc>,
    pub rental_days: u32,
    pub daily_rate: Money,
    pub total_amount: Money,
    pub discount: Money,
    pub final_amount: Money,
    pub pickup_km: Option<i64>,
    pub return_km: Option<i64>,
    pub fuel_level: Option<FuelLevel>,
    pub return_fuel_level: Option<FuelLevel>,
    pub km_limit: Option<i64>,
    pub over_limit_km_fee: Money,
    pub late_fee: Money,
    pub returned_at: Option<DateTime<Utc>>,
    pub damage_marks: Vec<DamageMark>,
    pub damage_inspection: Option<String>,
    pub return_notes: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractResponse {
    /// Renders a contract with its status as of `now`
    pub fn at(contract: &RentalContract, now: DateTime<Utc>) -> Self {
        Self {
            id: contract.id(),
            contract_number: contract.contract_number().to_string(),
            vehicle_id: contract.vehicle_id(),
            client: contract.client().clone(),
            status: contract.status_at(now),
            rental_start: contract.rental_start(),
            rental_end: contract.rental_end(),
            rental_days: contract.rental_days(),
            daily_rate: contract.daily_rate(),
            total_amount: contract.total_amount(),
            discount: contract.discount(),
            final_amount: contract.final_amount(),
            pickup_km: contract.pickup_km(),
            return_km: contract.return_km(),
            fuel_level: contract.fuel_level(),
            return_fuel_level: contract.return_fuel_level(),
            km_limit: contract.km_limit(),
            over_limit_km_fee: contract.over_limit_km_fee(),
            late_fee: contract.late_fee(),
            returned_at: contract.returned_at(),
            damage_marks: contract.damage_marks().to_vec(),
            damage_inspection: contract.damage_inspection().map(str::to_string),
            return_notes: contract.return_notes().map(str::to_string),
            version: contract.version(),
            created_at: contract.created_at(),
            updated_at: contract.updated_at(),
        }
    }
}

/// Overlapping bookings, by number
#[derive(Debug, Serialize)]
pub struct ConflictSummary {
    pub vehicle_id: VehicleId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: usize,
    pub contract_numbers: Vec<String>,
}

impl From<&ConflictReport> for ConflictSummary {
    fn from(report: &ConflictReport) -> Self {
        Self {
            vehicle_id: report.vehicle_id,
            start: report.candidate.start(),
            end: report.candidate.end(),
            count: report.count,
            contract_numbers: report.contract_numbers().into_iter().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContractOpeningResponse {
    pub contract: ContractResponse,
    pub rate_tier: Option<RateTier>,
    pub conflicts: ConflictSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_count_mismatch: Option<DayCountMismatch>,
}

#[derive(Debug, Serialize)]
pub struct RenewalResponse {
    pub contract: ContractResponse,
    pub additional_days: u32,
    pub additional_cost: Money,
    pub previous_end: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
    pub conflicts: ConflictSummary,
}

impl RenewalResponse {
    pub fn new(contract: ContractResponse, quote: &RenewalQuote, conflicts: &ConflictReport) -> Self {
        Self {
            contract,
            additional_days: quote.additional_days,
            additional_cost: quote.additional_cost,
            previous_end: quote.previous_end,
            new_end: quote.new_end,
            conflicts: conflicts.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub contract: ContractResponse,
    pub settlement: SettlementOutcome,
    pub amount_due: Money,
    pub invoice: Invoice,
}

#[derive(Debug, Serialize)]
pub struct AmendmentResponse {
    pub contract: ContractResponse,
    pub amendment: domain_rental::ContractAmendment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<ConflictSummary>,
}
