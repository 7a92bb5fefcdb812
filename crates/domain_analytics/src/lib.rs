//! Analytics Domain
//!
//! Fleet profitability: revenue from contracts (or invoices), maintenance
//! spend and pro-rated insurance, per vehicle and for the whole fleet, with
//! utilization and a contract status breakdown.
//!
//! [`analyze`] is a pure function over already loaded data;
//! [`ProfitabilityService`] loads the data for a scope and window and calls it.

pub mod profitability;
pub mod services;
pub mod error;

pub use profitability::{
    ProfitabilityReport, ReportData, ReportParams, RevenueBasis, StatusBreakdown,
    VehicleProfitability, analyze, prorated_insurance, status_breakdown, utilization,
};
pub use services::{ProfitabilityService, ReportScope};
pub use error::AnalyticsError;
