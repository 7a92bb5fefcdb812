//! API error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_analytics::AnalyticsError;
use domain_billing::BillingError;
use domain_fleet::FleetError;
use domain_rental::RentalError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level validation failures on a request body
    #[error("Validation error: {0}")]
    InvalidFields(#[from] validator::ValidationErrors),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal server error".to_string(), None)
            }
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone(), None),
            ApiError::InvalidFields(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request body failed validation".to_string(),
                Some(field_messages(errors)),
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

fn field_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();
    messages.sort();
    messages
}

/// Maps a domain error onto a status by its classifiers
fn classify(validation: bool, conflict: bool, not_found: bool, message: String) -> ApiError {
    if validation {
        ApiError::Validation(message)
    } else if conflict {
        ApiError::Conflict(message)
    } else if not_found {
        ApiError::NotFound(message)
    } else {
        ApiError::Internal(message)
    }
}

impl From<RentalError> for ApiError {
    fn from(err: RentalError) -> Self {
        classify(err.is_validation(), err.is_conflict(), err.is_not_found(), err.to_string())
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        classify(err.is_validation(), err.is_conflict(), err.is_not_found(), err.to_string())
    }
}

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        classify(err.is_validation(), err.is_conflict(), err.is_not_found(), err.to_string())
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        classify(err.is_validation(), err.is_conflict(), err.is_not_found(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PortError;

    #[test]
    fn test_rental_errors_map_to_statuses() {
        let validation: ApiError = RentalError::validation("bad").into();
        assert!(matches!(validation, ApiError::Validation(_)));

        let exhausted: ApiError = RentalError::RetriesExhausted {
            contract: "CTR-001".to_string(),
            attempts: 3,
        }
        .into();
        assert!(matches!(exhausted, ApiError::Conflict(_)));

        let missing: ApiError = RentalError::contract_not_found("CTR-404").into();
        assert!(matches!(missing, ApiError::NotFound(_)));
    }

    #[test]
    fn test_connection_failure_is_internal() {
        let err: ApiError = FleetError::Port(PortError::connection("refused")).into();
        assert!(matches!(err, ApiError::Internal(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Validation("x".into()).into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::Conflict("x".into()).into_response().status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::NotFound("x".into()).into_response().status(), StatusCode::NOT_FOUND);
    }
}
