//! Analytics domain services

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use core_kernel::{Clock, Currency, DateRange, Timezone, VehicleId};
use domain_billing::{InvoicePort, InvoiceQuery};
use domain_fleet::{FleetPort, MaintenanceQuery};
use domain_rental::{ContractPort, ContractQuery};

use crate::error::AnalyticsError;
use crate::profitability::{analyze, ProfitabilityReport, ReportData, ReportParams, RevenueBasis};

/// Vehicles a report covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "vehicle_id", rename_all = "snake_case")]
pub enum ReportScope {
    #[default]
    Fleet,
    Vehicle(VehicleId),
}

/// Profitability reporting over the stores
pub struct ProfitabilityService {
    fleet: Arc<dyn FleetPort>,
    contracts: Arc<dyn ContractPort>,
    invoices: Arc<dyn InvoicePort>,
    clock: Arc<dyn Clock>,
    timezone: Timezone,
    currency: Currency,
}

impl ProfitabilityService {
    pub fn new(
        fleet: Arc<dyn FleetPort>,
        contracts: Arc<dyn ContractPort>,
        invoices: Arc<dyn InvoicePort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fleet,
            contracts,
            invoices,
            clock,
            timezone: Timezone::default(),
            currency: Currency::USD,
        }
    }

    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Profitability of a vehicle or the fleet between two dates, inclusive
    ///
    /// # Errors
    ///
    /// Validation if `end < start`, not found for an unknown scoped vehicle
    #[instrument(skip(self))]
    pub async fn analyze(
        &self,
        scope: ReportScope,
        start: NaiveDate,
        end: NaiveDate,
        basis: RevenueBasis,
    ) -> Result<ProfitabilityReport, AnalyticsError> {
        let window = DateRange::new(start, end)
            .map_err(|_| AnalyticsError::validation(format!("report end {} is before start {}", end, start)))?;

        let data = self.load(scope, window, basis).await?;
        let params = ReportParams {
            window,
            basis,
            timezone: self.timezone,
            now: self.clock.now(),
            currency: self.currency,
        };
        let report = analyze(&data, &params)?;

        info!(
            vehicles = report.vehicles.len(),
            contracts = report.contract_count,
            net_profit = %report.net_profit,
            "Profitability report built"
        );
        Ok(report)
    }

    async fn load(
        &self,
        scope: ReportScope,
        window: DateRange,
        basis: RevenueBasis,
    ) -> Result<ReportData, AnalyticsError> {
        let (vehicles, contract_query, maintenance_query) = match scope {
            ReportScope::Fleet => (
                self.fleet.list_vehicles().await?,
                ContractQuery::all(),
                MaintenanceQuery::default(),
            ),
            ReportScope::Vehicle(id) => {
                let vehicle = self.fleet.get_vehicle(id).await.map_err(|e| {
                    if e.is_not_found() {
                        AnalyticsError::VehicleNotFound(id.to_string())
                    } else {
                        e.into()
                    }
                })?;
                (vec![vehicle], ContractQuery::for_vehicle(id), MaintenanceQuery::for_vehicle(id))
            }
        };

        let contracts = self.contracts.list_contracts(contract_query).await?;
        let maintenance = self.fleet.list_maintenance(maintenance_query.within(window)).await?;
        let invoices = match basis {
            RevenueBasis::ContractStart => Vec::new(),
            RevenueBasis::InvoiceDate => {
                self.invoices
                    .list_invoices(InvoiceQuery::all().issued_within(window))
                    .await?
            }
        };

        Ok(ReportData {
            vehicles,
            contracts,
            maintenance,
            invoices,
        })
    }
}
