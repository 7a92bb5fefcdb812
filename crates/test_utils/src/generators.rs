//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{DateTime, Duration, TimeZone, Utc};
use core_kernel::{Currency, Money, RentalPeriod, VehicleId};
use domain_rental::FuelLevel;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating currencies vehicles are priced in
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::AED),
        Just(Currency::SAR),
    ]
}

/// Strategy for daily rates between 10.00 and 500.00 USD
pub fn daily_rate_strategy() -> impl Strategy<Value = Money> {
    (1_000i64..50_000i64).prop_map(|cents| Money::usd(Decimal::new(cents, 2)))
}

/// Strategy for declared rental lengths in days
pub fn rental_days_strategy() -> impl Strategy<Value = u32> {
    1u32..120u32
}

/// Strategy for a rate, a day count, and a discount that never exceeds the total
pub fn priced_rental_strategy() -> impl Strategy<Value = (Money, u32, Money)> {
    (daily_rate_strategy(), rental_days_strategy(), 0u32..=100u32).prop_map(|(rate, days, pct)| {
        let total = rate.multiply(Decimal::from(days)).round2();
        let discount = total.multiply(Decimal::new(i64::from(pct), 2)).round2();
        (rate, days, discount)
    })
}

/// Strategy for odometer readings
pub fn odometer_strategy() -> impl Strategy<Value = i64> {
    0i64..400_000i64
}

pub fn fuel_level_strategy() -> impl Strategy<Value = FuelLevel> {
    prop_oneof![
        Just(FuelLevel::Empty),
        Just(FuelLevel::Quarter),
        Just(FuelLevel::Half),
        Just(FuelLevel::ThreeQuarters),
        Just(FuelLevel::Full),
    ]
}

/// Strategy for instants within 2026, on the hour
pub fn instant_2026_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..365 * 24).prop_map(|hours| Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours))
}

/// Strategy for rental periods of one hour to sixty days
pub fn rental_period_strategy() -> impl Strategy<Value = RentalPeriod> {
    (instant_2026_strategy(), 1i64..60 * 24).prop_map(|(start, hours)| {
        RentalPeriod::new(start, start + Duration::hours(hours)).expect("end is after start")
    })
}

pub fn vehicle_id_strategy() -> impl Strategy<Value = VehicleId> {
    any::<[u8; 16]>().prop_map(|bytes| VehicleId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for plate numbers like `B-123456`
pub fn plate_strategy() -> impl Strategy<Value = String> {
    ("[A-Z]", 100_000u32..999_999u32).prop_map(|(letter, digits)| format!("{}-{}", letter, digits))
}

/// Strategy for names
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}".prop_map(|s| s)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn discount_never_exceeds_total((rate, days, discount) in priced_rental_strategy()) {
            let total = rate.multiply(Decimal::from(days)).round2();
            prop_assert!(discount.amount() <= total.amount());
            prop_assert!(!discount.is_negative());
        }

        #[test]
        fn rental_period_ends_after_start(period in rental_period_strategy()) {
            prop_assert!(period.end() > period.start());
        }

        #[test]
        fn fuel_quarters_are_bounded(level in fuel_level_strategy()) {
            prop_assert!((0..=4).contains(&level.quarters()));
        }
    }
}
