//! Vehicle entity and tiered rate selection

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, VehicleId};

use crate::error::FleetError;
use crate::insurance::{InsurancePolicy, InsuranceRenewal};

/// Operational status of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
    #[serde(rename = "Out of Service")]
    OutOfService,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Available",
            VehicleStatus::Rented => "Rented",
            VehicleStatus::Maintenance => "Maintenance",
            VehicleStatus::OutOfService => "Out of Service",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Available" => Some(VehicleStatus::Available),
            "Rented" => Some(VehicleStatus::Rented),
            "Maintenance" => Some(VehicleStatus::Maintenance),
            "Out of Service" | "OutOfService" => Some(VehicleStatus::OutOfService),
            _ => None,
        }
    }
}

/// Which of the vehicle's rate cards priced a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTier {
    Daily,
    Weekly,
    Monthly,
}

/// A per-day rate chosen for a booking length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieredRate {
    pub tier: RateTier,
    /// Per-day amount to multiply by the rental days
    pub daily_rate: Money,
}

/// Bookings at least this long use the weekly card when one exists
pub const WEEKLY_TIER_MIN_DAYS: u32 = 7;
/// Bookings at least this long use the monthly card when one exists
pub const MONTHLY_TIER_MIN_DAYS: u32 = 30;

/// A rentable vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    /// Per-day rate for short rentals
    pub daily_rate: Money,
    /// Per-day rate applied to rentals of a week or more
    pub weekly_rate: Option<Money>,
    /// Per-day rate applied to rentals of a month or more
    pub monthly_rate: Option<Money>,
    /// Odometer reading in km
    pub mileage: i64,
    pub status: VehicleStatus,
    /// Annual insurance premium
    pub insurance_cost: Money,
    /// Current policy term, if one is on record
    pub insurance: Option<InsurancePolicy>,
    pub purchase_cost: Option<Money>,
    pub next_maintenance_date: Option<NaiveDate>,
    pub next_maintenance_km: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Creates an available vehicle with only a daily rate
    ///
    /// # Errors
    ///
    /// Returns `FleetError::Validation` if the daily rate is negative or finer
    /// than a cent, or the plate number is blank
    pub fn new(
        plate_number: impl Into<String>,
        brand: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        daily_rate: Money,
    ) -> Result<Self, FleetError> {
        let plate_number = plate_number.into();
        if plate_number.trim().is_empty() {
            return Err(FleetError::validation("plate number is required"));
        }
        check_rate("daily rate", &daily_rate)?;

        let now = Utc::now();
        Ok(Self {
            id: VehicleId::new_v7(),
            plate_number,
            brand: brand.into(),
            model: model.into(),
            year,
            color: None,
            daily_rate,
            weekly_rate: None,
            monthly_rate: None,
            mileage: 0,
            status: VehicleStatus::Available,
            insurance_cost: Money::zero(daily_rate.currency()),
            insurance: None,
            purchase_cost: None,
            next_maintenance_date: None,
            next_maintenance_km: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Checks every rate card
    ///
    /// Rates are multiplied by whole days, so a rate finer than the
    /// currency's minor unit would make totals depend on where rounding
    /// happens.
    pub fn validate_rates(&self) -> Result<(), FleetError> {
        check_rate("daily rate", &self.daily_rate)?;
        for (label, rate) in [("weekly rate", self.weekly_rate), ("monthly rate", self.monthly_rate)] {
            if let Some(rate) = rate {
                check_rate(label, &rate)?;
                if rate.currency() != self.daily_rate.currency() {
                    return Err(FleetError::validation(format!(
                        "{} is in {}, daily rate in {}",
                        label,
                        rate.currency(),
                        self.daily_rate.currency()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn with_weekly_rate(mut self, rate: Money) -> Self {
        self.weekly_rate = Some(rate);
        self
    }

    pub fn with_monthly_rate(mut self, rate: Money) -> Self {
        self.monthly_rate = Some(rate);
        self
    }

    pub fn with_mileage(mut self, km: i64) -> Self {
        self.mileage = km;
        self
    }

    pub fn with_insurance_cost(mut self, annual: Money) -> Self {
        self.insurance_cost = annual;
        self
    }

    pub fn with_insurance(mut self, policy: InsurancePolicy) -> Self {
        self.insurance = Some(policy);
        self
    }

    pub fn with_purchase_cost(mut self, cost: Money) -> Self {
        self.purchase_cost = Some(cost);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_next_maintenance(mut self, date: Option<NaiveDate>, km: Option<i64>) -> Self {
        self.next_maintenance_date = date;
        self.next_maintenance_km = km;
        self
    }

    /// Currency the vehicle is priced in
    pub fn currency(&self) -> Currency {
        self.daily_rate.currency()
    }

    /// Selects the per-day rate for a booking of `rental_days`
    ///
    /// Monthly when the booking is 30 days or longer and a monthly rate is set,
    /// else weekly from 7 days when a weekly rate is set, else daily.
    pub fn rate_for(&self, rental_days: u32) -> TieredRate {
        match (self.monthly_rate, self.weekly_rate) {
            (Some(monthly), _) if rental_days >= MONTHLY_TIER_MIN_DAYS => TieredRate {
                tier: RateTier::Monthly,
                daily_rate: monthly,
            },
            (_, Some(weekly)) if rental_days >= WEEKLY_TIER_MIN_DAYS => TieredRate {
                tier: RateTier::Weekly,
                daily_rate: weekly,
            },
            _ => TieredRate {
                tier: RateTier::Daily,
                daily_rate: self.daily_rate,
            },
        }
    }

    /// Advances the odometer; readings never move backwards
    ///
    /// A reading lower than the current one is ignored and reported as `false`.
    pub fn record_mileage(&mut self, km: i64, at: DateTime<Utc>) -> bool {
        if km < self.mileage {
            return false;
        }
        self.mileage = km;
        self.updated_at = at;
        true
    }

    /// Starts a new one-year policy term
    ///
    /// The premium replaces the annual insurance cost. Provider and policy
    /// number carry over from the previous term unless the renewal names new
    /// ones.
    pub fn renew_insurance(&mut self, renewal: InsuranceRenewal, at: DateTime<Utc>) -> Result<(), FleetError> {
        check_rate("annual premium", &renewal.annual_premium)?;
        if renewal.annual_premium.currency() != self.currency() {
            return Err(FleetError::validation(format!(
                "annual premium is in {}, vehicle is priced in {}",
                renewal.annual_premium.currency(),
                self.currency()
            )));
        }

        let previous = self.insurance.as_ref();
        let provider = named(renewal.provider).or_else(|| previous.and_then(|p| p.provider.clone()));
        let policy_number = named(renewal.policy_number).or_else(|| previous.and_then(|p| p.policy_number.clone()));

        self.insurance = Some(InsurancePolicy::annual(renewal.start_date, provider, policy_number)?);
        self.insurance_cost = renewal.annual_premium;
        self.updated_at = at;
        Ok(())
    }

    pub fn set_status(&mut self, status: VehicleStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    /// Display label such as "Toyota Corolla (ABC-123)"
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.brand, self.model, self.plate_number)
    }
}

fn named(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn check_rate(label: &str, rate: &Money) -> Result<(), FleetError> {
    if rate.is_negative() {
        return Err(FleetError::validation(format!("{} must not be negative", label)));
    }
    if !rate.is_minor_unit_precise() {
        return Err(FleetError::validation(format!(
            "{} {} has more decimal places than {} allows",
            label,
            rate.amount(),
            rate.currency()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tiered_vehicle() -> Vehicle {
        Vehicle::new("B-12345", "Toyota", "Corolla", 2023, Money::usd(dec!(40)))
            .unwrap()
            .with_weekly_rate(Money::usd(dec!(35)))
            .with_monthly_rate(Money::usd(dec!(30)))
    }

    #[test]
    fn test_rate_tiers() {
        let v = tiered_vehicle();
        assert_eq!(v.rate_for(6).tier, RateTier::Daily);
        assert_eq!(v.rate_for(7).daily_rate.amount(), dec!(35));
        assert_eq!(v.rate_for(29).tier, RateTier::Weekly);
        assert_eq!(v.rate_for(30).daily_rate.amount(), dec!(30));
    }

    #[test]
    fn test_missing_weekly_rate_falls_back_to_daily() {
        let v = Vehicle::new("B-1", "Kia", "Rio", 2022, Money::usd(dec!(25))).unwrap();
        assert_eq!(v.rate_for(10).tier, RateTier::Daily);
        assert_eq!(v.rate_for(45).daily_rate.amount(), dec!(25));
    }

    #[test]
    fn test_sub_cent_rates_rejected() {
        let err = Vehicle::new("B-2", "Kia", "Rio", 2022, Money::usd(dec!(33.335))).unwrap_err();
        assert!(err.is_validation());

        let weekly = tiered_vehicle().with_weekly_rate(Money::usd(dec!(29.999)));
        assert!(weekly.validate_rates().unwrap_err().is_validation());
        assert!(tiered_vehicle().validate_rates().is_ok());
    }

    #[test]
    fn test_insurance_renewal_runs_one_year() {
        let start = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let mut v = tiered_vehicle().with_insurance(InsurancePolicy {
            provider: Some("AXA".to_string()),
            policy_number: Some("P-100".to_string()),
            start_date: None,
            expiry_date: start,
        });

        let renewal = InsuranceRenewal {
            start_date: start,
            annual_premium: Money::usd(dec!(1350)),
            provider: None,
            policy_number: Some("P-200".to_string()),
        };
        v.renew_insurance(renewal, Utc::now()).unwrap();

        let policy = v.insurance.as_ref().unwrap();
        assert_eq!(policy.expiry_date, NaiveDate::from_ymd_opt(2027, 6, 15).unwrap());
        assert_eq!(policy.provider.as_deref(), Some("AXA"));
        assert_eq!(policy.policy_number.as_deref(), Some("P-200"));
        assert_eq!(v.insurance_cost.amount(), dec!(1350));
    }

    #[test]
    fn test_insurance_renewal_rejects_bad_premium() {
        let mut v = tiered_vehicle();
        let renewal = InsuranceRenewal {
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            annual_premium: Money::usd(dec!(-5)),
            provider: None,
            policy_number: None,
        };
        assert!(v.renew_insurance(renewal, Utc::now()).unwrap_err().is_validation());
        assert!(v.insurance.is_none());
    }

    #[test]
    fn test_mileage_never_decreases() {
        let mut v = tiered_vehicle().with_mileage(10_000);
        assert!(!v.record_mileage(9_000, Utc::now()));
        assert_eq!(v.mileage, 10_000);
        assert!(v.record_mileage(10_650, Utc::now()));
        assert_eq!(v.mileage, 10_650);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(VehicleStatus::OutOfService.as_str(), "Out of Service");
        assert_eq!(VehicleStatus::parse("Out of Service"), Some(VehicleStatus::OutOfService));
        assert_eq!(VehicleStatus::parse("Parked"), None);
    }
}
