//! Unit tests for the Money module
//!
//! Tests cover creation, arithmetic, half-up rounding, VAT application and
//! secondary-currency conversion.

use core_kernel::{round0, round2, Currency, Money, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_usd_shorthand() {
        let m = Money::usd(dec!(50));
        assert_eq!(m.currency(), Currency::USD);
        assert_eq!(m.amount(), dec!(50));
    }

    #[test]
    fn test_zero_and_sign_predicates() {
        let zero = Money::zero(Currency::LBP);
        assert!(zero.is_zero());
        assert!(!zero.is_negative());
        assert!(!zero.is_positive());

        assert!(Money::usd(dec!(-0.01)).is_negative());
        assert!(Money::usd(dec!(0.01)).is_positive());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_sub_can_go_negative() {
        let total = Money::usd(dec!(100));
        let discount = Money::usd(dec!(120));

        let result = total.checked_sub(&discount).unwrap();
        assert_eq!(result.amount(), dec!(-20));
        assert!(result.floor_zero().is_zero());
    }

    #[test]
    fn test_sum_rejects_mixed_currencies() {
        let items = [Money::usd(dec!(1)), Money::new(dec!(1), Currency::EUR)];
        let result = Money::sum(Currency::USD, items.iter());
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_sum_of_lines() {
        let items = [
            Money::usd(dec!(350)),
            Money::usd(dec!(30)),
            Money::usd(dec!(150)),
            Money::usd(dec!(-20)),
        ];
        let total = Money::sum(Currency::USD, items.iter()).unwrap();
        assert_eq!(total.amount(), dec!(510));
    }

    #[test]
    fn test_minor_unit_precision() {
        assert!(Money::usd(dec!(50)).is_minor_unit_precise());
        assert!(Money::usd(dec!(50.10)).is_minor_unit_precise());
        assert!(Money::usd(dec!(50.1000)).is_minor_unit_precise());
        assert!(!Money::usd(dec!(33.335)).is_minor_unit_precise());
        assert!(Money::new(dec!(89700), Currency::LBP).is_minor_unit_precise());
        assert!(!Money::new(dec!(0.5), Currency::LBP).is_minor_unit_precise());
    }
}

mod rounding {
    use super::*;

    #[test]
    fn test_round2_half_up_on_midpoint() {
        assert_eq!(round2(dec!(0.125)), dec!(0.13));
        assert_eq!(round2(dec!(0.135)), dec!(0.14));
    }

    #[test]
    fn test_round0_half_up_on_midpoint() {
        assert_eq!(round0(dec!(2.5)), dec!(3));
        assert_eq!(round0(dec!(3.5)), dec!(4));
    }

    #[test]
    fn test_round_to_currency_uses_currency_precision() {
        let lbp = Money::new(dec!(1234.5), Currency::LBP).round_to_currency();
        assert_eq!(lbp.amount(), dec!(1235));

        let usd = Money::usd(dec!(1234.565)).round_to_currency();
        assert_eq!(usd.amount(), dec!(1234.57));
    }
}

mod rates_and_conversion {
    use super::*;

    #[test]
    fn test_eleven_percent_vat_on_350() {
        let vat = Rate::from_percentage(dec!(11));
        let tax = vat.apply(&Money::usd(dec!(350)));
        assert_eq!(tax.amount(), dec!(38.50));
    }

    #[test]
    fn test_vat_rounding_on_odd_cents() {
        let vat = Rate::from_percentage(dec!(11));
        // 12.35 * 0.11 = 1.3585
        let tax = vat.apply(&Money::usd(dec!(12.35)));
        assert_eq!(tax.amount(), dec!(1.36));
    }

    #[test]
    fn test_conversion_freezes_whole_pounds() {
        let usd = Money::usd(dec!(38.50));
        let lbp = usd.convert(Currency::LBP, dec!(89700)).unwrap();
        assert_eq!(lbp.amount(), dec!(3453450));
    }

    #[test]
    fn test_conversion_with_fractional_rate() {
        let usd = Money::usd(dec!(100));
        let aed = usd.convert(Currency::AED, dec!(3.6725)).unwrap();
        assert_eq!(aed.amount(), dec!(367.25));
    }

    #[test]
    fn test_display_uses_currency_symbol() {
        assert_eq!(Money::usd(dec!(388.5)).to_string(), "$ 388.50");
        assert_eq!(Money::new(dec!(34848450), Currency::LBP).to_string(), "L.L. 34848450");
    }
}
