//! Report handlers

use axum::{
    extract::{Query, State},
    Json,
};

use domain_analytics::{ProfitabilityReport, ReportScope};

use crate::dto::reports::ProfitabilityQuery;
use crate::{AppState, error::ApiError};

/// Revenue, maintenance, insurance and utilization over a date window
pub async fn profitability(
    State(state): State<AppState>,
    Query(params): Query<ProfitabilityQuery>,
) -> Result<Json<ProfitabilityReport>, ApiError> {
    let scope = match params.vehicle_id {
        Some(id) => ReportScope::Vehicle(id.into()),
        None => ReportScope::Fleet,
    };
    let report = state
        .analytics
        .analyze(scope, params.start, params.end, params.basis)
        .await?;
    Ok(Json(report))
}
