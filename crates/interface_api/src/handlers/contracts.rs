//! Contract handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::Money;
use domain_rental::{ContractAmendment, ContractQuery, DamageMark, NewContract, RentalError, SettlementRequest};

use crate::dto::contracts::*;
use crate::extract::ValidatedJson;
use crate::{AppState, error::ApiError};

/// Opens a contract
///
/// Overlapping bookings do not block; they are listed under `conflicts`.
pub async fn create_contract(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateContractRequest>,
) -> Result<(StatusCode, Json<ContractOpeningResponse>), ApiError> {
    let vehicle_id = request.vehicle_id.into();

    let (daily_rate, discount) = if request.daily_rate.is_some() || request.discount.is_some() {
        let currency = state.fleet.get_vehicle(vehicle_id).await?.currency();
        (
            request.daily_rate.map(|amount| Money::new(amount, currency)),
            request.discount.map(|amount| Money::new(amount, currency)),
        )
    } else {
        (None, None)
    };

    let damage_marks = request
        .damage_marks
        .into_iter()
        .map(|mark| DamageMark::new(mark.x, mark.y, mark.description))
        .collect::<Result<Vec<_>, RentalError>>()?;

    let opening = state
        .rental
        .create_contract(NewContract {
            vehicle_id,
            client: request.client.into(),
            rental_start: request.rental_start,
            rental_end: request.rental_end,
            rental_days: request.rental_days,
            daily_rate,
            discount,
            pickup_km: request.pickup_km,
            fuel_level: request.fuel_level,
            km_limit: request.km_limit,
            damage_marks,
            damage_inspection: request.damage_inspection,
        })
        .await?;

    let now = state.clock.now();
    Ok((
        StatusCode::CREATED,
        Json(ContractOpeningResponse {
            contract: ContractResponse::at(&opening.contract, now),
            rate_tier: opening.rate_tier,
            conflicts: ConflictSummary::from(&opening.conflicts),
            day_count_mismatch: opening.day_count_mismatch,
        }),
    ))
}

/// Lists contracts by start date
pub async fn list_contracts(
    State(state): State<AppState>,
    Query(params): Query<ContractListQuery>,
) -> Result<Json<Vec<ContractResponse>>, ApiError> {
    let mut query = match params.vehicle_id {
        Some(id) => ContractQuery::for_vehicle(id.into()),
        None => ContractQuery::all(),
    };
    if params.open_only {
        query = query.open_only();
    }

    let now = state.clock.now();
    let contracts = state.rental.list_contracts(query).await?;
    Ok(Json(contracts.iter().map(|c| ContractResponse::at(c, now)).collect()))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractResponse>, ApiError> {
    let contract = state.rental.get_contract(id.into()).await?;
    Ok(Json(ContractResponse::at(&contract, state.clock.now())))
}

pub async fn get_by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<ContractResponse>, ApiError> {
    let contract = state.rental.get_by_number(&number).await?;
    Ok(Json(ContractResponse::at(&contract, state.clock.now())))
}

/// Reports bookings that overlap a candidate window
pub async fn check_availability(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<Json<ConflictSummary>, ApiError> {
    let report = state
        .rental
        .check_availability(
            params.vehicle_id.into(),
            params.start,
            params.end,
            params.exclude.map(Into::into),
        )
        .await?;
    Ok(Json(ConflictSummary::from(&report)))
}

/// Extends a contract by whole days at its current rate
pub async fn renew_contract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RenewContractRequest>,
) -> Result<Json<RenewalResponse>, ApiError> {
    let outcome = state.rental.renew_contract(id.into(), request.additional_days).await?;
    let contract = ContractResponse::at(&outcome.contract, state.clock.now());
    Ok(Json(RenewalResponse::new(contract, &outcome.quote, &outcome.conflicts)))
}

/// Records the return, fixes the settlement fees and issues the invoice
pub async fn settle_contract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SettleContractRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let now = state.clock.now();
    let settled = state
        .invoices
        .settle_and_invoice(
            &state.rental,
            id.into(),
            SettlementRequest {
                return_km: request.return_km,
                return_fuel_level: request.return_fuel_level,
                returned_at: request.returned_at.unwrap_or(now),
                return_notes: request.return_notes,
                damage_inspection: request.damage_inspection,
            },
        )
        .await?;

    let contract = &settled.settlement.contract;
    let amount_due = contract.amount_due().map_err(RentalError::from)?;
    Ok(Json(SettlementResponse {
        contract: ContractResponse::at(contract, now),
        settlement: settled.settlement.outcome,
        amount_due,
        invoice: settled.invoice.invoice,
    }))
}

/// Changes the daily rate and reprices the contract
pub async fn amend_rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AmendRateRequest>,
) -> Result<Json<AmendmentResponse>, ApiError> {
    let currency = state.rental.get_contract(id.into()).await?.currency();
    let result = state
        .rental
        .amend_rate(id.into(), Money::new(request.daily_rate, currency), request.reason)
        .await?;

    Ok(Json(AmendmentResponse {
        contract: ContractResponse::at(&result.contract, state.clock.now()),
        amendment: result.amendment,
        conflicts: result.conflicts.as_ref().map(ConflictSummary::from),
    }))
}

/// Moves the contract onto another available vehicle
pub async fn change_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<ChangeVehicleRequest>,
) -> Result<Json<AmendmentResponse>, ApiError> {
    let result = state
        .rental
        .change_vehicle(id.into(), request.vehicle_id.into(), request.reason)
        .await?;

    Ok(Json(AmendmentResponse {
        contract: ContractResponse::at(&result.contract, state.clock.now()),
        amendment: result.amendment,
        conflicts: result.conflicts.as_ref().map(ConflictSummary::from),
    }))
}

/// Sets or clears the operator status override
pub async fn override_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<StatusOverrideRequest>,
) -> Result<Json<ContractResponse>, ApiError> {
    let contract = state.rental.override_status(id.into(), request.status).await?;
    Ok(Json(ContractResponse::at(&contract, state.clock.now())))
}

/// Amendment history, oldest first
pub async fn list_amendments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ContractAmendment>>, ApiError> {
    Ok(Json(state.rental.list_amendments(id.into()).await?))
}
