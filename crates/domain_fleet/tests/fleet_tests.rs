//! Tests for domain_fleet

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{DateRange, Money, VehicleId};

use domain_fleet::alerts::evaluate;
use domain_fleet::{
    derive_vehicle_status, maintenance_alerts, AlertThresholds, DueType, MaintenanceQuery,
    MaintenanceRecord, MaintenanceType, RateTier, Vehicle, VehicleStatus,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn corolla() -> Vehicle {
    Vehicle::new("ABC-123", "Toyota", "Corolla", 2023, Money::usd(dec!(50)))
        .unwrap()
        .with_weekly_rate(Money::usd(dec!(45)))
        .with_monthly_rate(Money::usd(dec!(38)))
        .with_mileage(42_000)
        .with_insurance_cost(Money::usd(dec!(1200)))
        .with_purchase_cost(Money::usd(dec!(18000)))
}

// ============================================================================
// Vehicle Tests
// ============================================================================

mod vehicle_tests {
    use super::*;

    #[test]
    fn test_new_vehicle_defaults() {
        let v = Vehicle::new("XYZ-9", "Hyundai", "Accent", 2024, Money::usd(dec!(35))).unwrap();

        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(v.mileage, 0);
        assert!(v.insurance_cost.is_zero());
        assert!(v.purchase_cost.is_none());
        assert!(v.is_available());
    }

    #[test]
    fn test_blank_plate_rejected() {
        let result = Vehicle::new("  ", "Hyundai", "Accent", 2024, Money::usd(dec!(35)));
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_rate_rejected() {
        let result = Vehicle::new("XYZ-9", "Hyundai", "Accent", 2024, Money::usd(dec!(-1)));
        assert!(result.is_err());
    }

    #[test]
    fn test_label() {
        assert_eq!(corolla().label(), "Toyota Corolla (ABC-123)");
    }

    #[test]
    fn test_tier_boundaries() {
        let v = corolla();
        assert_eq!(v.rate_for(1).tier, RateTier::Daily);
        assert_eq!(v.rate_for(6).daily_rate.amount(), dec!(50));
        assert_eq!(v.rate_for(7).tier, RateTier::Weekly);
        assert_eq!(v.rate_for(30).tier, RateTier::Monthly);
        assert_eq!(v.rate_for(90).daily_rate.amount(), dec!(38));
    }

    #[test]
    fn test_status_serializes_with_spaces() {
        let json = serde_json::to_string(&VehicleStatus::OutOfService).unwrap();
        assert_eq!(json, "\"Out of Service\"");
    }
}

// ============================================================================
// Maintenance Tests
// ============================================================================

mod maintenance_tests {
    use super::*;

    fn oil_change(vehicle_id: VehicleId, on: NaiveDate) -> MaintenanceRecord {
        MaintenanceRecord::new(
            vehicle_id,
            MaintenanceType::OilChange,
            "Oil change",
            Money::usd(dec!(60)),
            on,
        )
        .unwrap()
    }

    #[test]
    fn test_closed_visit_is_not_open() {
        let record = oil_change(VehicleId::new(), date(2026, 1, 5))
            .with_garage_stay(date(2026, 1, 5), Some(date(2026, 1, 6)))
            .unwrap();
        assert!(!record.is_open());
    }

    #[test]
    fn test_record_without_stay_is_not_open() {
        assert!(!oil_change(VehicleId::new(), date(2026, 1, 5)).is_open());
    }

    #[test]
    fn test_query_filters_by_vehicle_and_window() {
        let vehicle_id = VehicleId::new();
        let january = DateRange::new(date(2026, 1, 1), date(2026, 1, 31)).unwrap();
        let query = MaintenanceQuery::for_vehicle(vehicle_id).within(january);

        assert!(query.matches(&oil_change(vehicle_id, date(2026, 1, 31))));
        assert!(!query.matches(&oil_change(vehicle_id, date(2026, 2, 1))));
        assert!(!query.matches(&oil_change(VehicleId::new(), date(2026, 1, 10))));
    }

    #[test]
    fn test_default_query_matches_everything() {
        assert!(MaintenanceQuery::default().matches(&oil_change(VehicleId::new(), date(2020, 1, 1))));
    }
}

// ============================================================================
// Alert Tests
// ============================================================================

mod alert_tests {
    use super::*;

    #[test]
    fn test_due_by_date_only() {
        let today = date(2026, 5, 1);
        let v = corolla().with_next_maintenance(Some(date(2026, 5, 4)), Some(60_000));

        let alert = evaluate(&v, today, AlertThresholds::default()).unwrap();
        assert_eq!(alert.due_type, DueType::Date);
        assert_eq!(alert.days_until_due, Some(3));
        assert_eq!(alert.km_until_due, Some(18_000));
    }

    #[test]
    fn test_overdue_by_mileage() {
        let today = date(2026, 5, 1);
        let v = corolla().with_next_maintenance(None, Some(41_800));

        let alert = evaluate(&v, today, AlertThresholds::default()).unwrap();
        assert_eq!(alert.due_type, DueType::Mileage);
        assert_eq!(alert.km_until_due, Some(-200));
    }

    #[test]
    fn test_no_schedule_no_alert() {
        assert!(evaluate(&corolla(), date(2026, 5, 1), AlertThresholds::default()).is_none());
    }

    #[test]
    fn test_fleet_alerts_sorted_and_skip_out_of_service() {
        let today = date(2026, 5, 1);
        let soon = corolla().with_next_maintenance(Some(date(2026, 5, 6)), None);
        let overdue = corolla().with_next_maintenance(Some(date(2026, 4, 28)), Some(42_100));
        let mut retired = corolla().with_next_maintenance(Some(date(2026, 4, 1)), None);
        retired.set_status(VehicleStatus::OutOfService, Utc::now());

        let alerts = maintenance_alerts(&[soon, overdue.clone(), retired], today, AlertThresholds::default());

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].vehicle_id, overdue.id);
        assert_eq!(alerts[0].due_type, DueType::Both);
        assert_eq!(alerts[1].days_until_due, Some(5));
    }
}

// ============================================================================
// Status Derivation Tests
// ============================================================================

mod status_tests {
    use super::*;

    #[test]
    fn test_contract_beats_maintenance() {
        assert_eq!(
            derive_vehicle_status(VehicleStatus::Maintenance, true, true),
            VehicleStatus::Rented
        );
    }

    #[test]
    fn test_idle_vehicle_is_available() {
        assert_eq!(
            derive_vehicle_status(VehicleStatus::Rented, false, false),
            VehicleStatus::Available
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_tier_rate_is_one_of_the_cards(days in 1u32..400) {
        let v = corolla();
        let chosen = v.rate_for(days).daily_rate.amount();
        prop_assert!([dec!(50), dec!(45), dec!(38)].contains(&chosen));
    }

    #[test]
    fn prop_mileage_is_monotonic(readings in proptest::collection::vec(0i64..200_000, 1..20)) {
        let mut v = corolla().with_mileage(0);
        let mut max = 0i64;
        for km in readings {
            v.record_mileage(km, Utc::now());
            max = max.max(km);
            prop_assert_eq!(v.mileage, max);
        }
    }

    #[test]
    fn prop_longer_bookings_never_cost_more_per_day(days in 1u32..200) {
        let v = corolla();
        let shorter: Decimal = v.rate_for(days).daily_rate.amount();
        let longer: Decimal = v.rate_for(days + 1).daily_rate.amount();
        prop_assert!(longer <= shorter);
    }
}
