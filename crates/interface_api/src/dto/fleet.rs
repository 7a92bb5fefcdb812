//! Fleet DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use core_kernel::Currency;
use domain_fleet::{MaintenanceType, VehicleStatus, DEFAULT_EXPIRY_THRESHOLD_DAYS};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub plate_number: String,
    #[validate(length(min = 1))]
    pub brand: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(range(min = 1950, max = 2100))]
    pub year: i32,
    pub color: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: Currency,
    pub daily_rate: Decimal,
    pub weekly_rate: Option<Decimal>,
    pub monthly_rate: Option<Decimal>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub mileage: i64,
    /// Annual premium
    pub insurance_cost: Option<Decimal>,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
    pub insurance_start_date: Option<NaiveDate>,
    /// Defaults to one year after the start date when only that is given
    pub insurance_expiry_date: Option<NaiveDate>,
    pub purchase_cost: Option<Decimal>,
    pub next_maintenance_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub next_maintenance_km: Option<i64>,
    /// Defaults to `Available`; `Out of Service` parks the car on arrival
    pub status: Option<VehicleStatus>,
}

fn default_currency() -> Currency {
    Currency::USD
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordMaintenanceRequest {
    pub vehicle_id: uuid::Uuid,
    pub maintenance_type: MaintenanceType,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,
    pub cost: Decimal,
    pub performed_at: NaiveDate,
    pub garage_entry_date: Option<NaiveDate>,
    pub garage_exit_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub mileage_at_service: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CloseMaintenanceRequest {
    pub exit_date: NaiveDate,
}

/// Filters for the maintenance listing
#[derive(Debug, Default, Deserialize)]
pub struct MaintenanceListQuery {
    pub vehicle_id: Option<uuid::Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenewInsuranceRequest {
    pub start_date: NaiveDate,
    /// Annual premium in the vehicle's currency
    pub annual_premium: Decimal,
    #[validate(length(max = 200))]
    pub provider: Option<String>,
    #[validate(length(max = 100))]
    pub policy_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringInsuranceQuery {
    #[serde(default = "default_expiry_days")]
    pub days: i64,
}

fn default_expiry_days() -> i64 {
    DEFAULT_EXPIRY_THRESHOLD_DAYS
}
