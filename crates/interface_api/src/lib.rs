//! HTTP API Layer
//!
//! REST surface of the rental engine using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one module per area (fleet, contracts, invoices, reports)
//! - **Middleware**: request tracing and request logging
//! - **DTOs**: request bodies, query strings and contract responses
//! - **Error Handling**: domain errors mapped onto status codes in [`error`]
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState, config::AppConfig};
//!
//! let config = AppConfig::from_env()?;
//! let state = AppState::from_pool(pool, clock, &config)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use core_kernel::{Clock, HealthCheckable, TemporalError};
use domain_analytics::ProfitabilityService;
use domain_billing::{InvoicePort, InvoiceService};
use domain_fleet::{FleetPort, FleetService};
use domain_rental::{ContractPort, RentalService};
use infra_db::{PostgresContractAdapter, PostgresFleetAdapter, PostgresInvoiceAdapter};

use crate::config::AppConfig;
use crate::middleware::request_log_middleware;
use crate::handlers::{contracts, fleet, health, invoices, reports};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub fleet: Arc<FleetService>,
    pub rental: Arc<RentalService>,
    pub invoices: Arc<InvoiceService>,
    pub analytics: Arc<ProfitabilityService>,
    pub clock: Arc<dyn Clock>,
    /// Probed by the readiness endpoint
    pub health_checks: Vec<Arc<dyn HealthCheckable>>,
}

impl AppState {
    /// Wires the services over the given ports
    ///
    /// # Errors
    ///
    /// Fails if the configured business timezone is not a known IANA name
    pub fn new(
        fleet_port: Arc<dyn FleetPort>,
        contract_port: Arc<dyn ContractPort>,
        invoice_port: Arc<dyn InvoicePort>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> Result<Self, TemporalError> {
        let billing = config.effective_billing();
        let timezone = config.business_timezone()?;

        let fleet = FleetService::new(fleet_port.clone(), clock.clone()).with_thresholds(config.alerts);
        let rental = RentalService::new(contract_port.clone(), fleet_port.clone(), clock.clone())
            .with_config(config.rental);
        let invoices = InvoiceService::new(invoice_port.clone(), contract_port.clone(), clock.clone())
            .with_config(billing);
        let analytics = ProfitabilityService::new(fleet_port, contract_port, invoice_port, clock.clone())
            .with_timezone(timezone);

        Ok(Self {
            fleet: Arc::new(fleet),
            rental: Arc::new(rental),
            invoices: Arc::new(invoices),
            analytics: Arc::new(analytics),
            clock,
            health_checks: Vec::new(),
        })
    }

    /// Wires the PostgreSQL adapters and registers them for readiness
    pub fn from_pool(pool: PgPool, clock: Arc<dyn Clock>, config: &AppConfig) -> Result<Self, TemporalError> {
        let fleet = Arc::new(PostgresFleetAdapter::new(pool.clone()));
        let contracts = Arc::new(PostgresContractAdapter::new(pool.clone()));
        let invoices = Arc::new(PostgresInvoiceAdapter::new(pool));

        let state = Self::new(fleet.clone(), contracts.clone(), invoices.clone(), clock, config)?;
        Ok(state
            .with_health_check(fleet)
            .with_health_check(contracts)
            .with_health_check(invoices))
    }

    pub fn with_health_check(mut self, check: Arc<dyn HealthCheckable>) -> Self {
        self.health_checks.push(check);
        self
    }
}

/// Creates the main API router
///
/// Health probes sit at the root; everything else lives under `/api/v1`.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let fleet_routes = Router::new()
        .route("/vehicles", post(fleet::create_vehicle).get(fleet::list_vehicles))
        .route("/vehicles/:id", get(fleet::get_vehicle))
        .route("/vehicles/:id/reconcile", post(fleet::reconcile_vehicle))
        .route("/vehicles/:id/insurance", post(fleet::renew_insurance))
        .route("/maintenance", post(fleet::record_maintenance).get(fleet::list_maintenance))
        .route("/maintenance/:id/close", post(fleet::close_maintenance))
        .route("/alerts", get(fleet::maintenance_alerts))
        .route("/insurance/expiring", get(fleet::expiring_insurance))
        .route("/insurance/expired", get(fleet::expired_insurance));

    let contract_routes = Router::new()
        .route("/", post(contracts::create_contract).get(contracts::list_contracts))
        .route("/availability", get(contracts::check_availability))
        .route("/by-number/:number", get(contracts::get_by_number))
        .route("/:id", get(contracts::get_contract))
        .route("/:id/renew", post(contracts::renew_contract))
        .route("/:id/settle", post(contracts::settle_contract))
        .route("/:id/status", put(contracts::override_status))
        .route("/:id/amendments", get(contracts::list_amendments))
        .route("/:id/amendments/rate", post(contracts::amend_rate))
        .route("/:id/amendments/vehicle", post(contracts::change_vehicle))
        .route("/:id/invoice", post(invoices::issue_invoice).get(invoices::get_contract_invoice));

    let invoice_routes = Router::new()
        .route("/", get(invoices::list_invoices))
        .route("/mark-overdue", post(invoices::mark_overdue))
        .route("/:id", get(invoices::get_invoice))
        .route("/:id/payment", put(invoices::update_payment));

    let report_routes = Router::new()
        .route("/profitability", get(reports::profitability));

    let api_routes = Router::new()
        .nest("/fleet", fleet_routes)
        .nest("/contracts", contract_routes)
        .nest("/invoices", invoice_routes)
        .nest("/reports", report_routes)
        .layer(axum_middleware::from_fn(request_log_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
