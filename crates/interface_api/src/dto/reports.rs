//! Report DTOs

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use domain_analytics::RevenueBasis;

/// Window is inclusive on both ends
#[derive(Debug, Deserialize)]
pub struct ProfitabilityQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Restricts the report to one vehicle
    pub vehicle_id: Option<Uuid>,
    #[serde(default)]
    pub basis: RevenueBasis,
}
