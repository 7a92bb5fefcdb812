//! Profitability aggregation
//!
//! Revenue, maintenance cost and pro-rated insurance per vehicle over an
//! inclusive date window, rolled up to the scope.
//!
//! | Figure        | Per vehicle                                              |
//! |---------------|----------------------------------------------------------|
//! | revenue       | amount due of contracts starting in the window, or the   |
//! |               | pre-tax subtotal of invoices dated in it                 |
//! | maintenance   | cost of records performed in the window                  |
//! | insurance     | annual premium × min(window days, 365) / 365             |
//! | utilization   | booked days inside the window / window days, capped at 1 |
//!
//! Scope totals are sums except utilization, which is the mean over the
//! vehicles in scope.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ContractId, Currency, DateRange, Money, RentalPeriod, Timezone, VehicleId};
use domain_billing::{Invoice, PaymentStatus};
use domain_fleet::{MaintenanceRecord, Vehicle};
use domain_rental::{ContractStatus, RentalContract};

use crate::error::AnalyticsError;

const DAYS_PER_YEAR: i64 = 365;
const SECONDS_PER_DAY: i64 = 86_400;
const RATIO_DP: u32 = 4;

/// Which date places revenue in a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueBasis {
    /// Contract start date; revenue is the contract's amount due
    #[default]
    ContractStart,
    /// Invoice date; revenue is the invoice subtotal, cancelled invoices excluded
    InvoiceDate,
}

/// Report parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportParams {
    pub window: DateRange,
    pub basis: RevenueBasis,
    /// Business calendar used to read contract start dates
    pub timezone: Timezone,
    /// Instant at which contract statuses are resolved
    pub now: DateTime<Utc>,
    pub currency: Currency,
}

impl ReportParams {
    pub fn new(window: DateRange, now: DateTime<Utc>) -> Self {
        Self {
            window,
            basis: RevenueBasis::default(),
            timezone: Timezone::default(),
            now,
            currency: Currency::USD,
        }
    }

    pub fn with_basis(mut self, basis: RevenueBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }
}

/// Everything a report reads, already restricted to the scope's vehicles
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    pub vehicles: Vec<Vehicle>,
    pub contracts: Vec<RentalContract>,
    pub maintenance: Vec<MaintenanceRecord>,
    /// Only read for [`RevenueBasis::InvoiceDate`]
    pub invoices: Vec<Invoice>,
}

/// Contract counts by effective status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub active: u32,
    pub overdue: u32,
    pub completed: u32,
}

impl StatusBreakdown {
    pub fn total(&self) -> u32 {
        self.active + self.overdue + self.completed
    }
}

/// Counts contracts by their status at `now`
pub fn status_breakdown<'a, I>(contracts: I, now: DateTime<Utc>) -> StatusBreakdown
where
    I: IntoIterator<Item = &'a RentalContract>,
{
    contracts
        .into_iter()
        .fold(StatusBreakdown::default(), |mut acc, contract| {
            match contract.status_at(now) {
                ContractStatus::Active => acc.active += 1,
                ContractStatus::Overdue => acc.overdue += 1,
                ContractStatus::Completed => acc.completed += 1,
            }
            acc
        })
}

/// One vehicle's figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleProfitability {
    pub vehicle_id: VehicleId,
    pub label: String,
    pub revenue: Money,
    pub maintenance_cost: Money,
    pub insurance_cost: Money,
    pub net_profit: Money,
    pub profit_margin: Decimal,
    /// Net profit over purchase cost, when a purchase cost is recorded
    pub roi: Option<Decimal>,
    pub contract_count: u32,
    pub utilization: Decimal,
}

/// Profitability over a window for a vehicle or the fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitabilityReport {
    pub window: DateRange,
    pub basis: RevenueBasis,
    pub total_revenue: Money,
    pub total_maintenance_cost: Money,
    pub insurance_cost: Money,
    pub net_profit: Money,
    pub profit_margin: Decimal,
    pub vehicle_utilization: Decimal,
    pub contract_count: u32,
    /// Statuses of contracts starting in the window
    pub status_breakdown: StatusBreakdown,
    /// Highest net profit first
    pub vehicles: Vec<VehicleProfitability>,
}

/// Annual premium scaled to a window of `window_days`
pub fn prorated_insurance(annual: Money, window_days: i64) -> Money {
    let days = window_days.clamp(0, DAYS_PER_YEAR);
    annual
        .multiply(Decimal::from(days) / Decimal::from(DAYS_PER_YEAR))
        .round2()
}

/// Share of the window covered by `bookings`, capped at 1
pub fn utilization<'a, I>(bookings: I, window: &RentalPeriod) -> Decimal
where
    I: IntoIterator<Item = &'a RentalPeriod>,
{
    let window_secs = (window.end() - window.start()).num_seconds();
    if window_secs <= 0 {
        return Decimal::ZERO;
    }
    let booked_secs: i64 = bookings
        .into_iter()
        .map(|p| p.overlap_duration(window).num_seconds())
        .sum();
    let booked_days = Decimal::from(booked_secs) / Decimal::from(SECONDS_PER_DAY);
    let window_days = Decimal::from(window_secs) / Decimal::from(SECONDS_PER_DAY);
    (booked_days / window_days).min(Decimal::ONE).round_dp(RATIO_DP)
}

fn starts_in_window(contract: &RentalContract, params: &ReportParams) -> bool {
    params
        .window
        .contains(params.timezone.local_date(contract.rental_start()))
}

fn margin(net: &Money, revenue: &Money) -> Decimal {
    if revenue.is_positive() {
        (net.amount() / revenue.amount()).round_dp(RATIO_DP)
    } else {
        Decimal::ZERO
    }
}

/// Builds the report for the vehicles in `data`
///
/// Empty inputs give a report of zeros.
///
/// # Errors
///
/// Returns `AnalyticsError::Money` if amounts in more than one currency meet
pub fn analyze(data: &ReportData, params: &ReportParams) -> Result<ProfitabilityReport, AnalyticsError> {
    let currency = params.currency;
    let window_days = params.window.days_inclusive();
    let window_period = params.window.to_period(&params.timezone)?;

    let vehicle_of: HashMap<ContractId, VehicleId> =
        data.contracts.iter().map(|c| (c.id(), c.vehicle_id())).collect();

    let mut vehicles = Vec::with_capacity(data.vehicles.len());
    for vehicle in &data.vehicles {
        let contracts: Vec<&RentalContract> = data
            .contracts
            .iter()
            .filter(|c| c.vehicle_id() == vehicle.id)
            .collect();

        let (revenue, contract_count) = match params.basis {
            RevenueBasis::ContractStart => {
                let mut revenue = Money::zero(currency);
                let mut count = 0;
                for contract in contracts.iter().filter(|c| starts_in_window(c, params)) {
                    revenue = revenue.checked_add(&contract.amount_due()?)?;
                    count += 1;
                }
                (revenue, count)
            }
            RevenueBasis::InvoiceDate => {
                let invoices: Vec<&Invoice> = data
                    .invoices
                    .iter()
                    .filter(|i| vehicle_of.get(&i.contract_id) == Some(&vehicle.id))
                    .filter(|i| i.payment_status != PaymentStatus::Cancelled)
                    .filter(|i| params.window.contains(i.invoice_date))
                    .collect();
                let revenue = Money::sum(currency, invoices.iter().map(|i| &i.subtotal))?;
                (revenue, invoices.len() as u32)
            }
        };

        let maintenance_cost = Money::sum(
            currency,
            data.maintenance
                .iter()
                .filter(|r| r.vehicle_id == vehicle.id && params.window.contains(r.performed_at))
                .map(|r| &r.cost),
        )?;
        let insurance_cost = prorated_insurance(vehicle.insurance_cost, window_days);
        let net_profit = revenue
            .checked_sub(&maintenance_cost)?
            .checked_sub(&insurance_cost)?;

        let roi = vehicle
            .purchase_cost
            .filter(Money::is_positive)
            .map(|cost| (net_profit.amount() / cost.amount()).round_dp(RATIO_DP));

        vehicles.push(VehicleProfitability {
            vehicle_id: vehicle.id,
            label: vehicle.label(),
            profit_margin: margin(&net_profit, &revenue),
            revenue,
            maintenance_cost,
            insurance_cost,
            net_profit,
            roi,
            contract_count,
            utilization: utilization(contracts.iter().map(|c| c.period()), &window_period),
        });
    }

    let total_revenue = Money::sum(currency, vehicles.iter().map(|v| &v.revenue))?;
    let total_maintenance_cost = Money::sum(currency, vehicles.iter().map(|v| &v.maintenance_cost))?;
    let insurance_cost = Money::sum(currency, vehicles.iter().map(|v| &v.insurance_cost))?;
    let net_profit = total_revenue
        .checked_sub(&total_maintenance_cost)?
        .checked_sub(&insurance_cost)?;

    let vehicle_utilization = if vehicles.is_empty() {
        Decimal::ZERO
    } else {
        let sum: Decimal = vehicles.iter().map(|v| v.utilization).sum();
        (sum / Decimal::from(vehicles.len() as u64)).round_dp(RATIO_DP)
    };

    let breakdown = status_breakdown(data.contracts.iter().filter(|c| starts_in_window(c, params)), params.now);

    vehicles.sort_by(|a, b| b.net_profit.amount().cmp(&a.net_profit.amount()));

    Ok(ProfitabilityReport {
        window: params.window,
        basis: params.basis,
        profit_margin: margin(&net_profit, &total_revenue),
        total_revenue,
        total_maintenance_cost,
        insurance_cost,
        net_profit,
        vehicle_utilization,
        contract_count: vehicles.iter().map(|v| v.contract_count).sum(),
        status_breakdown: breakdown,
        vehicles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn period(d1: u32, d2: u32) -> RentalPeriod {
        RentalPeriod::new(
            Utc.with_ymd_and_hms(2026, 3, d1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, d2, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_prorated_insurance() {
        let annual = Money::usd(dec!(1200));
        assert_eq!(prorated_insurance(annual, 31).amount(), dec!(101.92));
        assert_eq!(prorated_insurance(annual, 365).amount(), dec!(1200));
        assert_eq!(prorated_insurance(annual, 500).amount(), dec!(1200));
    }

    #[test]
    fn test_utilization_is_capped() {
        let window = period(1, 11);
        assert_eq!(utilization([&period(1, 6)], &window), dec!(0.5));
        assert_eq!(utilization([&period(1, 11), &period(3, 8)], &window), Decimal::ONE);
        assert_eq!(utilization(std::iter::empty::<&RentalPeriod>(), &window), Decimal::ZERO);
    }

    #[test]
    fn test_margin_without_revenue_is_zero() {
        let net = Money::usd(dec!(-40));
        assert_eq!(margin(&net, &Money::usd(dec!(0))), Decimal::ZERO);
    }
}
