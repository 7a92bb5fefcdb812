//! Invoice handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain_billing::{Invoice, InvoiceQuery};

use crate::dto::date_window;
use crate::dto::invoices::*;
use crate::extract::ValidatedJson;
use crate::{AppState, error::ApiError};

/// Issues the invoice for a settled contract
///
/// Settlement already issues it, so this normally answers 200 with the
/// stored invoice; 201 only when an earlier attempt failed after the return
/// was recorded. Open contracts get 422.
pub async fn issue_invoice(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<(StatusCode, Json<IssueInvoiceResponse>), ApiError> {
    let issued = state.invoices.issue_for_contract(contract_id.into()).await?;
    let code = if issued.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        code,
        Json(IssueInvoiceResponse {
            created: issued.created,
            invoice: issued.invoice,
        }),
    ))
}

pub async fn get_contract_invoice(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(state.invoices.get_for_contract(contract_id.into()).await?))
}

/// Lists invoices, newest first
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<InvoiceListQuery>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let mut query = InvoiceQuery::all();
    if let Some(status) = params.status {
        query = query.with_status(status);
    }
    if let Some(window) = date_window(params.from, params.to)? {
        query = query.issued_within(window);
    }
    Ok(Json(state.invoices.list_invoices(query).await?))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(state.invoices.get_invoice(id.into()).await?))
}

/// Moves an invoice along the payment state machine
pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<PaymentUpdateRequest>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = state
        .invoices
        .update_payment_status(id.into(), request.payment_status, request.payment_method)
        .await?;
    Ok(Json(invoice))
}

/// Flags pending invoices past their due date
pub async fn mark_overdue(State(state): State<AppState>) -> Result<Json<OverdueSweepResponse>, ApiError> {
    let invoices = state.invoices.mark_overdue_invoices().await?;
    Ok(Json(OverdueSweepResponse {
        marked: invoices.len(),
        invoices,
    }))
}
