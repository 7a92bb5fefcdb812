//! Insurance policies and expiry alerts
//!
//! A policy runs for one year from its start date. The alert list splits
//! vehicles into those already past expiry and those expiring within the
//! day threshold (30 by default).

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, VehicleId};

use crate::error::FleetError;
use crate::vehicle::Vehicle;

/// Days ahead of expiry at which a policy counts as expiring soon
pub const DEFAULT_EXPIRY_THRESHOLD_DAYS: i64 = 30;

/// The vehicle's current insurance cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub provider: Option<String>,
    pub policy_number: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
}

impl InsurancePolicy {
    /// A one-year policy starting on `start_date`
    pub fn annual(
        start_date: NaiveDate,
        provider: Option<String>,
        policy_number: Option<String>,
    ) -> Result<Self, FleetError> {
        let expiry_date = start_date
            .checked_add_months(Months::new(12))
            .ok_or_else(|| FleetError::validation(format!("policy start {} is out of range", start_date)))?;
        Ok(Self {
            provider,
            policy_number,
            start_date: Some(start_date),
            expiry_date,
        })
    }

    /// Whole days from `today` to expiry; negative once expired
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    pub fn status(&self, today: NaiveDate, threshold_days: i64) -> InsuranceStatus {
        let days = self.days_until_expiry(today);
        if days < 0 {
            InsuranceStatus::Expired
        } else if days <= threshold_days {
            InsuranceStatus::ExpiringSoon
        } else {
            InsuranceStatus::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceStatus {
    Expired,
    ExpiringSoon,
    Active,
    /// No expiry date on record
    None,
}

/// Status of a vehicle's cover; `None` when it has no policy on record
pub fn insurance_status(vehicle: &Vehicle, today: NaiveDate, threshold_days: i64) -> InsuranceStatus {
    vehicle
        .insurance
        .as_ref()
        .map_or(InsuranceStatus::None, |p| p.status(today, threshold_days))
}

/// A vehicle whose cover has lapsed or is about to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceAlert {
    pub vehicle_id: VehicleId,
    pub plate_number: String,
    pub label: String,
    pub status: InsuranceStatus,
    pub provider: Option<String>,
    pub policy_number: Option<String>,
    pub expiry_date: NaiveDate,
    pub days_until_expiry: i64,
    pub annual_premium: Money,
}

fn alert(vehicle: &Vehicle, policy: &InsurancePolicy, status: InsuranceStatus, today: NaiveDate) -> InsuranceAlert {
    InsuranceAlert {
        vehicle_id: vehicle.id,
        plate_number: vehicle.plate_number.clone(),
        label: vehicle.label(),
        status,
        provider: policy.provider.clone(),
        policy_number: policy.policy_number.clone(),
        expiry_date: policy.expiry_date,
        days_until_expiry: policy.days_until_expiry(today),
        annual_premium: vehicle.insurance_cost,
    }
}

fn collect(vehicles: &[Vehicle], today: NaiveDate, threshold_days: i64, wanted: InsuranceStatus) -> Vec<InsuranceAlert> {
    let mut alerts: Vec<InsuranceAlert> = vehicles
        .iter()
        .filter_map(|v| {
            let policy = v.insurance.as_ref()?;
            let status = policy.status(today, threshold_days);
            (status == wanted).then(|| alert(v, policy, status, today))
        })
        .collect();
    alerts.sort_by_key(|a| (a.expiry_date, a.plate_number.clone()));
    alerts
}

/// Vehicles whose policy expires between today and `threshold_days` ahead,
/// soonest first
pub fn expiring_insurance(vehicles: &[Vehicle], today: NaiveDate, threshold_days: i64) -> Vec<InsuranceAlert> {
    collect(vehicles, today, threshold_days, InsuranceStatus::ExpiringSoon)
}

/// Vehicles whose policy expired before today, longest lapsed first
pub fn expired_insurance(vehicles: &[Vehicle], today: NaiveDate) -> Vec<InsuranceAlert> {
    collect(vehicles, today, DEFAULT_EXPIRY_THRESHOLD_DAYS, InsuranceStatus::Expired)
}

/// A new policy term for a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceRenewal {
    pub start_date: NaiveDate,
    pub annual_premium: Money,
    /// Keeps the current provider when absent
    pub provider: Option<String>,
    /// Keeps the current policy number when absent
    pub policy_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn insured(plate: &str, expiry: NaiveDate) -> Vehicle {
        let mut v = Vehicle::new(plate, "Hyundai", "Accent", 2022, Money::usd(dec!(35))).unwrap();
        v.insurance = Some(InsurancePolicy {
            provider: Some("Allianz".to_string()),
            policy_number: None,
            start_date: None,
            expiry_date: expiry,
        });
        v
    }

    #[test]
    fn test_status_boundaries() {
        let today = date(2026, 5, 1);
        let policy = InsurancePolicy::annual(date(2025, 5, 31), None, None).unwrap();
        assert_eq!(policy.expiry_date, date(2026, 5, 31));
        assert_eq!(policy.status(today, 30), InsuranceStatus::ExpiringSoon);
        assert_eq!(policy.status(today, 29), InsuranceStatus::Active);
        assert_eq!(policy.status(date(2026, 5, 31), 30), InsuranceStatus::ExpiringSoon);
        assert_eq!(policy.status(date(2026, 6, 1), 30), InsuranceStatus::Expired);
    }

    #[test]
    fn test_leap_day_start_ends_on_last_of_february() {
        let policy = InsurancePolicy::annual(date(2028, 2, 29), None, None).unwrap();
        assert_eq!(policy.expiry_date, date(2029, 2, 28));
    }

    #[test]
    fn test_alert_lists_split_by_status() {
        let today = date(2026, 5, 1);
        let fleet = vec![
            insured("A-1", date(2026, 5, 20)),
            insured("A-2", date(2026, 4, 10)),
            insured("A-3", date(2026, 5, 5)),
            insured("A-4", date(2026, 9, 1)),
            Vehicle::new("A-5", "Kia", "Picanto", 2020, Money::usd(dec!(20))).unwrap(),
        ];

        let expiring = expiring_insurance(&fleet, today, DEFAULT_EXPIRY_THRESHOLD_DAYS);
        let plates: Vec<&str> = expiring.iter().map(|a| a.plate_number.as_str()).collect();
        assert_eq!(plates, vec!["A-3", "A-1"]);
        assert_eq!(expiring[0].days_until_expiry, 4);

        let expired = expired_insurance(&fleet, today);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].plate_number, "A-2");
        assert_eq!(expired[0].days_until_expiry, -21);

        assert_eq!(insurance_status(&fleet[4], today, 30), InsuranceStatus::None);
    }
}
