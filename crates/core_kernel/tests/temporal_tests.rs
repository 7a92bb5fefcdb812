//! Unit tests for rental periods, reporting windows and the business timezone

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{ceil_days, DateRange, RentalPeriod, TemporalError, Timezone};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod rental_period {
    use super::*;

    #[test]
    fn test_overlap_of_intersecting_periods() {
        let booked = RentalPeriod::new(at(2026, 3, 1), at(2026, 3, 5)).unwrap();
        let candidate = RentalPeriod::new(at(2026, 3, 4), at(2026, 3, 8)).unwrap();

        assert!(booked.overlaps(&candidate));
        assert!(candidate.overlaps(&booked));
        assert_eq!(booked.overlap_duration(&candidate), Duration::days(1));
    }

    #[test]
    fn test_containment_counts_as_overlap() {
        let outer = RentalPeriod::new(at(2026, 3, 1), at(2026, 3, 31)).unwrap();
        let inner = RentalPeriod::new(at(2026, 3, 10), at(2026, 3, 12)).unwrap();

        assert!(outer.overlaps(&inner));
        assert_eq!(outer.overlap_duration(&inner), Duration::days(2));
    }

    #[test]
    fn test_disjoint_periods_have_zero_overlap() {
        let a = RentalPeriod::new(at(2026, 3, 1), at(2026, 3, 5)).unwrap();
        let b = RentalPeriod::new(at(2026, 4, 1), at(2026, 4, 5)).unwrap();

        assert_eq!(a.overlap_duration(&b), Duration::zero());
    }

    #[test]
    fn test_contains_is_half_open() {
        let p = RentalPeriod::new(at(2026, 3, 1), at(2026, 3, 5)).unwrap();
        assert!(p.contains(at(2026, 3, 1)));
        assert!(!p.contains(at(2026, 3, 5)));
    }

    #[test]
    fn test_extended_by_days_moves_end_only() {
        let p = RentalPeriod::new(at(2026, 3, 1), at(2026, 3, 5)).unwrap();
        let extended = p.extended_by_days(5);

        assert_eq!(extended.start(), p.start());
        assert_eq!(extended.end(), at(2026, 3, 10));
    }

    #[test]
    fn test_end_before_start_rejected() {
        let result = RentalPeriod::new(at(2026, 3, 5), at(2026, 3, 1));
        assert!(matches!(result, Err(TemporalError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_calendar_days_rounds_up() {
        let p = RentalPeriod::new(at(2026, 3, 1), at(2026, 3, 8) + Duration::hours(2)).unwrap();
        assert_eq!(p.calendar_days(), 8);
    }
}

mod date_range {
    use super::*;

    #[test]
    fn test_inclusive_day_count() {
        let r = DateRange::new(date(2026, 1, 1), date(2026, 12, 31)).unwrap();
        assert_eq!(r.days_inclusive(), 365);

        let single = DateRange::new(date(2026, 5, 5), date(2026, 5, 5)).unwrap();
        assert_eq!(single.days_inclusive(), 1);
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert!(DateRange::new(date(2026, 2, 1), date(2026, 1, 1)).is_err());
    }

    #[test]
    fn test_contains_both_ends() {
        let r = DateRange::new(date(2026, 1, 1), date(2026, 1, 31)).unwrap();
        assert!(r.contains(date(2026, 1, 1)));
        assert!(r.contains(date(2026, 1, 31)));
        assert!(!r.contains(date(2026, 2, 1)));
    }

    #[test]
    fn test_utc_window_covers_whole_days() {
        let r = DateRange::new(date(2026, 3, 1), date(2026, 3, 10)).unwrap();
        let p = r.to_period(&Timezone::default()).unwrap();

        assert_eq!(p.start(), at(2026, 3, 1));
        assert_eq!(p.end(), at(2026, 3, 11));
    }
}

mod timezone {
    use super::*;

    #[test]
    fn test_parse_keeps_iana_name() {
        let tz = Timezone::parse("Asia/Dubai").unwrap();
        assert_eq!(tz.0.name(), "Asia/Dubai");
        assert_eq!(Timezone::default().0.name(), "UTC");
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(matches!(
            Timezone::parse("Mars/Olympus"),
            Err(TemporalError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let tz = Timezone::parse("Asia/Beirut").unwrap();
        let late_evening_utc = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(tz.local_date(late_evening_utc), date(2026, 3, 2));
    }
}

#[test]
fn test_ceil_days_for_three_late_days() {
    let end = at(2026, 2, 10);
    let returned = at(2026, 2, 13);
    assert_eq!(ceil_days(returned - end), 3);
    assert_eq!(ceil_days(returned + Duration::minutes(1) - end), 4);
}
