//! Maintenance-due alerts
//!
//! A vehicle is due when its next service date is within the day threshold
//! of today, or its next service odometer reading is within the km threshold
//! of the current mileage. Negative distances mean the service is overdue.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::VehicleId;

use crate::vehicle::{Vehicle, VehicleStatus};

/// Thresholds for raising an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub days_ahead: i64,
    pub km_ahead: i64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            days_ahead: 7,
            km_ahead: 500,
        }
    }
}

/// What triggered the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueType {
    Date,
    Mileage,
    Both,
}

/// A vehicle approaching or past its scheduled service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceAlert {
    pub vehicle_id: VehicleId,
    pub plate_number: String,
    pub label: String,
    pub due_type: DueType,
    pub next_maintenance_date: Option<NaiveDate>,
    pub next_maintenance_km: Option<i64>,
    pub current_mileage: i64,
    pub days_until_due: Option<i64>,
    pub km_until_due: Option<i64>,
}

/// Evaluates a single vehicle
pub fn evaluate(vehicle: &Vehicle, today: NaiveDate, thresholds: AlertThresholds) -> Option<MaintenanceAlert> {
    let days_until_due = vehicle
        .next_maintenance_date
        .map(|date| (date - today).num_days());
    let km_until_due = vehicle
        .next_maintenance_km
        .map(|km| km - vehicle.mileage);

    let date_due = days_until_due.is_some_and(|d| d <= thresholds.days_ahead);
    let km_due = km_until_due.is_some_and(|k| k <= thresholds.km_ahead);

    let due_type = match (date_due, km_due) {
        (true, true) => DueType::Both,
        (true, false) => DueType::Date,
        (false, true) => DueType::Mileage,
        (false, false) => return None,
    };

    Some(MaintenanceAlert {
        vehicle_id: vehicle.id,
        plate_number: vehicle.plate_number.clone(),
        label: vehicle.label(),
        due_type,
        next_maintenance_date: vehicle.next_maintenance_date,
        next_maintenance_km: vehicle.next_maintenance_km,
        current_mileage: vehicle.mileage,
        days_until_due,
        km_until_due,
    })
}

/// Collects alerts for the fleet, most urgent date first
///
/// Vehicles marked out of service are skipped.
pub fn maintenance_alerts(
    vehicles: &[Vehicle],
    today: NaiveDate,
    thresholds: AlertThresholds,
) -> Vec<MaintenanceAlert> {
    let mut alerts: Vec<MaintenanceAlert> = vehicles
        .iter()
        .filter(|v| v.status != VehicleStatus::OutOfService)
        .filter_map(|v| evaluate(v, today, thresholds))
        .collect();

    alerts.sort_by_key(|a| (a.days_until_due.unwrap_or(i64::MAX), a.km_until_due.unwrap_or(i64::MAX)));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Money;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn vehicle(mileage: i64, date: Option<NaiveDate>, km: Option<i64>) -> Vehicle {
        Vehicle::new("P-1", "Nissan", "Sunny", 2021, Money::usd(dec!(30)))
            .unwrap()
            .with_mileage(mileage)
            .with_next_maintenance(date, km)
    }

    #[test]
    fn test_date_within_seven_days() {
        let v = vehicle(1_000, NaiveDate::from_ymd_opt(2026, 3, 17), None);
        let alert = evaluate(&v, today(), AlertThresholds::default()).unwrap();
        assert_eq!(alert.due_type, DueType::Date);
        assert_eq!(alert.days_until_due, Some(7));
    }

    #[test]
    fn test_date_eight_days_out_is_quiet() {
        let v = vehicle(1_000, NaiveDate::from_ymd_opt(2026, 3, 18), None);
        assert!(evaluate(&v, today(), AlertThresholds::default()).is_none());
    }

    #[test]
    fn test_mileage_threshold() {
        let v = vehicle(19_500, None, Some(20_000));
        let alert = evaluate(&v, today(), AlertThresholds::default()).unwrap();
        assert_eq!(alert.due_type, DueType::Mileage);
        assert_eq!(alert.km_until_due, Some(500));
    }

    #[test]
    fn test_both_triggers() {
        let v = vehicle(21_000, NaiveDate::from_ymd_opt(2026, 3, 1), Some(20_000));
        let alert = evaluate(&v, today(), AlertThresholds::default()).unwrap();
        assert_eq!(alert.due_type, DueType::Both);
        assert_eq!(alert.days_until_due, Some(-9));
        assert_eq!(alert.km_until_due, Some(-1_000));
    }

    #[test]
    fn test_out_of_service_skipped_and_sorted() {
        let mut parked = vehicle(0, NaiveDate::from_ymd_opt(2026, 3, 11), None);
        parked.status = VehicleStatus::OutOfService;
        let later = vehicle(0, NaiveDate::from_ymd_opt(2026, 3, 15), None);
        let sooner = vehicle(0, NaiveDate::from_ymd_opt(2026, 3, 12), None);

        let alerts = maintenance_alerts(&[parked, later, sooner], today(), AlertThresholds::default());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].days_until_due, Some(2));
    }
}
