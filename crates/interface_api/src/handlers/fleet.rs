//! Fleet handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::Money;
use domain_fleet::{
    InsuranceAlert, InsurancePolicy, InsuranceRenewal, MaintenanceAlert, MaintenanceQuery, MaintenanceRecord, Vehicle,
    VehicleStatus,
};

use crate::dto::date_window;
use crate::dto::fleet::*;
use crate::extract::ValidatedJson;
use crate::{AppState, error::ApiError};

/// Registers a vehicle
pub async fn create_vehicle(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    let currency = request.currency;
    let money = |amount| Money::new(amount, currency);

    let mut vehicle = Vehicle::new(
        request.plate_number,
        request.brand,
        request.model,
        request.year,
        money(request.daily_rate),
    )?
    .with_mileage(request.mileage)
    .with_next_maintenance(request.next_maintenance_date, request.next_maintenance_km);

    if let Some(rate) = request.weekly_rate {
        vehicle = vehicle.with_weekly_rate(money(rate));
    }
    if let Some(rate) = request.monthly_rate {
        vehicle = vehicle.with_monthly_rate(money(rate));
    }
    if let Some(cost) = request.insurance_cost {
        vehicle = vehicle.with_insurance_cost(money(cost));
    }
    if let Some(cost) = request.purchase_cost {
        vehicle = vehicle.with_purchase_cost(money(cost));
    }
    match (request.insurance_start_date, request.insurance_expiry_date) {
        (start_date, Some(expiry_date)) => {
            vehicle = vehicle.with_insurance(InsurancePolicy {
                provider: request.insurance_provider,
                policy_number: request.insurance_policy_number,
                start_date,
                expiry_date,
            });
        }
        (Some(start), None) => {
            vehicle = vehicle.with_insurance(InsurancePolicy::annual(
                start,
                request.insurance_provider,
                request.insurance_policy_number,
            )?);
        }
        (None, None) => {}
    }
    if let Some(color) = request.color {
        vehicle = vehicle.with_color(color);
    }
    match request.status {
        Some(VehicleStatus::Rented) => {
            return Err(ApiError::Validation(
                "a vehicle is rented by opening a contract".to_string(),
            ))
        }
        Some(status) => vehicle.set_status(status, state.clock.now()),
        None => {}
    }

    let vehicle = state.fleet.register_vehicle(vehicle).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// Lists the fleet by plate
pub async fn list_vehicles(State(state): State<AppState>) -> Result<Json<Vec<Vehicle>>, ApiError> {
    Ok(Json(state.fleet.list_vehicles().await?))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, ApiError> {
    Ok(Json(state.fleet.get_vehicle(id.into()).await?))
}

/// Rebuilds the stored status from open contracts and garage visits
pub async fn reconcile_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, ApiError> {
    state.rental.reconcile_vehicle_status(id.into()).await?;
    Ok(Json(state.fleet.get_vehicle(id.into()).await?))
}

/// Records a workshop visit, priced in the vehicle's currency
pub async fn record_maintenance(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RecordMaintenanceRequest>,
) -> Result<(StatusCode, Json<MaintenanceRecord>), ApiError> {
    let vehicle = state.fleet.get_vehicle(request.vehicle_id.into()).await?;

    let mut record = MaintenanceRecord::new(
        vehicle.id,
        request.maintenance_type,
        request.description,
        Money::new(request.cost, vehicle.currency()),
        request.performed_at,
    )?;
    match (request.garage_entry_date, request.garage_exit_date) {
        (Some(entry), exit) => record = record.with_garage_stay(entry, exit)?,
        (None, Some(exit)) => record = record.with_garage_stay(request.performed_at, Some(exit))?,
        (None, None) => {}
    }
    if let Some(km) = request.mileage_at_service {
        record = record.with_mileage(km);
    }

    let record = state.fleet.record_maintenance(record).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Lists maintenance, optionally for one vehicle and a date window
pub async fn list_maintenance(
    State(state): State<AppState>,
    Query(params): Query<MaintenanceListQuery>,
) -> Result<Json<Vec<MaintenanceRecord>>, ApiError> {
    let mut query = match params.vehicle_id {
        Some(id) => MaintenanceQuery::for_vehicle(id.into()),
        None => MaintenanceQuery::default(),
    };
    if let Some(window) = date_window(params.from, params.to)? {
        query = query.within(window);
    }
    Ok(Json(state.fleet.list_maintenance(query).await?))
}

/// Ends a garage stay
pub async fn close_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CloseMaintenanceRequest>,
) -> Result<Json<MaintenanceRecord>, ApiError> {
    let record = state.fleet.close_maintenance(id.into(), request.exit_date).await?;
    Ok(Json(record))
}

/// Vehicles due or overdue for service
pub async fn maintenance_alerts(State(state): State<AppState>) -> Result<Json<Vec<MaintenanceAlert>>, ApiError> {
    Ok(Json(state.fleet.maintenance_alerts().await?))
}

/// Vehicles whose insurance expires within `?days=` (30 by default)
pub async fn expiring_insurance(
    State(state): State<AppState>,
    Query(params): Query<ExpiringInsuranceQuery>,
) -> Result<Json<Vec<InsuranceAlert>>, ApiError> {
    Ok(Json(state.fleet.expiring_insurance(params.days).await?))
}

pub async fn expired_insurance(State(state): State<AppState>) -> Result<Json<Vec<InsuranceAlert>>, ApiError> {
    Ok(Json(state.fleet.expired_insurance().await?))
}

/// Starts a one-year policy term, priced in the vehicle's currency
pub async fn renew_insurance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RenewInsuranceRequest>,
) -> Result<Json<Vehicle>, ApiError> {
    let vehicle = state.fleet.get_vehicle(id.into()).await?;
    let renewal = InsuranceRenewal {
        start_date: request.start_date,
        annual_premium: Money::new(request.annual_premium, vehicle.currency()),
        provider: request.provider,
        policy_number: request.policy_number,
    };
    Ok(Json(state.fleet.renew_insurance(vehicle.id, renewal).await?))
}
