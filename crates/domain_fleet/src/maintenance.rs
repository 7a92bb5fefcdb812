//! Maintenance records
//!
//! Records are written by the workshop workflow and read by the profitability
//! report (as cost) and by vehicle status reconciliation (an open garage visit
//! keeps the vehicle in `Maintenance`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{MaintenanceRecordId, Money, VehicleId};

use crate::error::FleetError;

/// Kind of workshop visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceType {
    Routine,
    Repair,
    Inspection,
    Emergency,
    #[serde(rename = "Oil Change")]
    OilChange,
    #[serde(rename = "Brake Pads Change")]
    BrakePadsChange,
    #[serde(rename = "Oil + Filter")]
    OilAndFilter,
}

impl MaintenanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceType::Routine => "Routine",
            MaintenanceType::Repair => "Repair",
            MaintenanceType::Inspection => "Inspection",
            MaintenanceType::Emergency => "Emergency",
            MaintenanceType::OilChange => "Oil Change",
            MaintenanceType::BrakePadsChange => "Brake Pads Change",
            MaintenanceType::OilAndFilter => "Oil + Filter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Routine" => Some(MaintenanceType::Routine),
            "Repair" => Some(MaintenanceType::Repair),
            "Inspection" => Some(MaintenanceType::Inspection),
            "Emergency" => Some(MaintenanceType::Emergency),
            "Oil Change" => Some(MaintenanceType::OilChange),
            "Brake Pads Change" => Some(MaintenanceType::BrakePadsChange),
            "Oil + Filter" => Some(MaintenanceType::OilAndFilter),
            _ => None,
        }
    }
}

/// A single workshop visit and its cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: MaintenanceRecordId,
    pub vehicle_id: VehicleId,
    pub maintenance_type: MaintenanceType,
    pub description: String,
    pub cost: Money,
    /// Date the work was performed, used for cost windows
    pub performed_at: NaiveDate,
    pub garage_entry_date: Option<NaiveDate>,
    pub garage_exit_date: Option<NaiveDate>,
    pub mileage_at_service: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl MaintenanceRecord {
    /// Creates a record
    ///
    /// # Errors
    ///
    /// Returns `FleetError::Validation` if the cost is negative or the garage
    /// exit precedes the entry
    pub fn new(
        vehicle_id: VehicleId,
        maintenance_type: MaintenanceType,
        description: impl Into<String>,
        cost: Money,
        performed_at: NaiveDate,
    ) -> Result<Self, FleetError> {
        if cost.is_negative() {
            return Err(FleetError::validation("maintenance cost must not be negative"));
        }
        Ok(Self {
            id: MaintenanceRecordId::new_v7(),
            vehicle_id,
            maintenance_type,
            description: description.into(),
            cost,
            performed_at,
            garage_entry_date: None,
            garage_exit_date: None,
            mileage_at_service: None,
            created_at: Utc::now(),
        })
    }

    /// Records the garage stay; `exit` may be unknown while the car is inside
    pub fn with_garage_stay(
        mut self,
        entry: NaiveDate,
        exit: Option<NaiveDate>,
    ) -> Result<Self, FleetError> {
        if let Some(exit) = exit {
            if exit < entry {
                return Err(FleetError::validation(
                    "garage exit date must not precede entry date",
                ));
            }
        }
        self.garage_entry_date = Some(entry);
        self.garage_exit_date = exit;
        Ok(self)
    }

    pub fn with_mileage(mut self, km: i64) -> Self {
        self.mileage_at_service = Some(km);
        self
    }

    /// True while the vehicle is in the garage for this visit
    pub fn is_open(&self) -> bool {
        self.garage_entry_date.is_some() && self.garage_exit_date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_open_visit() {
        let record = MaintenanceRecord::new(
            VehicleId::new(),
            MaintenanceType::Repair,
            "Gearbox",
            Money::usd(dec!(420)),
            day(3),
        )
        .unwrap()
        .with_garage_stay(day(3), None)
        .unwrap();

        assert!(record.is_open());
    }

    #[test]
    fn test_exit_before_entry_rejected() {
        let result = MaintenanceRecord::new(
            VehicleId::new(),
            MaintenanceType::Routine,
            "Service",
            Money::usd(dec!(80)),
            day(3),
        )
        .unwrap()
        .with_garage_stay(day(5), Some(day(4)));

        assert!(result.is_err());
    }

    #[test]
    fn test_negative_cost_rejected() {
        let result = MaintenanceRecord::new(
            VehicleId::new(),
            MaintenanceType::OilAndFilter,
            "Oil",
            Money::usd(dec!(-1)),
            day(1),
        );
        assert!(matches!(result, Err(FleetError::Validation(_))));
    }

    #[test]
    fn test_type_strings_match_storage() {
        for t in [
            MaintenanceType::Routine,
            MaintenanceType::OilChange,
            MaintenanceType::BrakePadsChange,
            MaintenanceType::OilAndFilter,
        ] {
            assert_eq!(MaintenanceType::parse(t.as_str()), Some(t));
        }
    }
}
