//! Tests for domain_billing

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{round2, Currency, Money, RentalPeriod, VehicleId};
use domain_rental::{
    compute_settlement, price_rental, ClientDetails, ContractDraft, FuelLevel, RentalContract,
    SettlementPolicy, SettlementRequest,
};

use domain_billing::{
    compile_invoice, financial_settings, BillingConfig, BillingError, Invoice, LineItemKind,
    PaymentMethod, PaymentStatus,
};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn contract(rate: Decimal, days: u32, discount: Decimal) -> RentalContract {
    let start = at(2026, 2, 3);
    let draft = ContractDraft {
        vehicle_id: VehicleId::new(),
        client: ClientDetails::new("Maya", "Saad"),
        period: RentalPeriod::new(start, start + chrono::Duration::days(i64::from(days))).unwrap(),
        pricing: price_rental(Money::usd(rate), days, Money::usd(discount)).unwrap(),
        pickup_km: Some(10_000),
        fuel_level: Some(FuelLevel::Full),
        km_limit: Some(500),
        damage_marks: vec![],
        damage_inspection: None,
        opened_at: start,
    };
    RentalContract::from_draft("CTR-012", draft)
}

/// Week at $50 returned 3 days late with 650 km driven, $0.20/km overage
fn settled_late_contract() -> RentalContract {
    let mut contract = contract(dec!(50), 7, dec!(0));
    let request = SettlementRequest {
        return_km: 10_650,
        return_fuel_level: Some(FuelLevel::Half),
        returned_at: at(2026, 2, 13),
        return_notes: Some("Scratch on rear bumper".to_string()),
        damage_inspection: None,
    };
    let policy = SettlementPolicy {
        per_km_overage_rate: Some(dec!(0.20)),
    };
    let outcome = compute_settlement(&contract, &request, &policy).unwrap();
    contract.apply_settlement(&request, &outcome, at(2026, 2, 13)).unwrap();
    contract
}

fn issue(contract: &RentalContract) -> Invoice {
    let draft = compile_invoice(contract, &BillingConfig::default(), date(2026, 2, 13)).unwrap();
    Invoice::from_draft("INV-00001", draft, at(2026, 2, 13))
}

// ============================================================================
// Compiler Tests
// ============================================================================

mod compiler_tests {
    use super::*;

    #[test]
    fn test_week_at_fifty_with_vat() {
        let draft = compile_invoice(&contract(dec!(50), 7, dec!(0)), &BillingConfig::default(), date(2026, 2, 10))
            .unwrap();

        assert_eq!(draft.line_items.len(), 1);
        assert_eq!(draft.line_items[0].kind, LineItemKind::Rental);
        assert_eq!(draft.line_items[0].quantity, dec!(7));
        assert_eq!(draft.subtotal.amount(), dec!(350));
        assert_eq!(draft.tax_amount.amount(), dec!(38.50));
        assert_eq!(draft.total_amount.amount(), dec!(388.50));
        assert_eq!(draft.due_date, date(2026, 3, 12));
    }

    #[test]
    fn test_secondary_currency_projection() {
        let draft = compile_invoice(&contract(dec!(50), 7, dec!(0)), &BillingConfig::default(), date(2026, 2, 10))
            .unwrap();

        assert_eq!(draft.projection.currency, Currency::LBP);
        assert_eq!(draft.projection.exchange_rate, dec!(89700));
        assert_eq!(draft.projection.subtotal.amount(), dec!(31395000));
        assert_eq!(draft.projection.tax_amount.amount(), dec!(3453450));
        assert_eq!(draft.projection.total_amount.amount(), dec!(34848450));
    }

    #[test]
    fn test_settled_contract_lines() {
        let contract = settled_late_contract();
        let draft = compile_invoice(&contract, &BillingConfig::default(), date(2026, 2, 13)).unwrap();

        let kinds: Vec<_> = draft.line_items.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LineItemKind::Rental, LineItemKind::KmOverage, LineItemKind::LateFee]);

        let overage = &draft.line_items[1];
        assert_eq!(overage.quantity, dec!(150));
        assert_eq!(overage.unit_price.amount(), dec!(0.20));
        assert_eq!(overage.amount.amount(), dec!(30));

        let late = &draft.line_items[2];
        assert_eq!(late.quantity, dec!(3));
        assert_eq!(late.amount.amount(), dec!(150));

        assert_eq!(draft.subtotal.amount(), dec!(530));
        assert_eq!(draft.tax_amount.amount(), dec!(58.30));
        assert_eq!(draft.total_amount.amount(), dec!(588.30));
        assert_eq!(draft.notes.as_deref(), Some("Scratch on rear bumper"));
    }

    #[test]
    fn test_discount_line_is_negative() {
        let draft = compile_invoice(&contract(dec!(45), 10, dec!(50)), &BillingConfig::default(), date(2026, 2, 3))
            .unwrap();

        let discount = draft.line_items.iter().find(|l| l.kind == LineItemKind::Discount).unwrap();
        assert_eq!(discount.amount.amount(), dec!(-50));
        assert_eq!(draft.subtotal.amount(), dec!(400));
    }

    #[test]
    fn test_inconsistent_base_line_is_rejected() {
        let mut record = contract(dec!(50), 7, dec!(0)).to_record();
        record.total_amount = Money::usd(dec!(340));
        record.final_amount = Money::usd(dec!(340));
        let broken = RentalContract::from_record(record).unwrap();

        let err = compile_invoice(&broken, &BillingConfig::default(), date(2026, 2, 10)).unwrap_err();
        assert!(matches!(err, BillingError::Unreconciled { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn test_country_settings_seed_config() {
        let uae = financial_settings("United Arab Emirates").unwrap();
        let config = BillingConfig {
            secondary_currency: Currency::AED,
            ..BillingConfig::default()
        }
        .with_country_settings(&uae);

        let draft = compile_invoice(&contract(dec!(100), 2, dec!(0)), &config, date(2026, 2, 3)).unwrap();
        assert_eq!(draft.tax_amount.amount(), dec!(10));
        assert_eq!(draft.projection.total_amount.amount(), dec!(771));
    }

    #[test]
    fn test_bad_exchange_rate_is_validation() {
        let config = BillingConfig {
            exchange_rate: dec!(0),
            ..BillingConfig::default()
        };
        let err = compile_invoice(&contract(dec!(50), 7, dec!(0)), &config, date(2026, 2, 10)).unwrap_err();
        assert!(err.is_validation());
    }
}

// ============================================================================
// Payment Status Tests
// ============================================================================

mod payment_tests {
    use super::*;

    #[test]
    fn test_paid_sets_paid_at_once() {
        let mut invoice = issue(&contract(dec!(50), 7, dec!(0)));
        assert_eq!(invoice.payment_status, PaymentStatus::Pending);
        assert!(invoice.paid_at.is_none());

        invoice
            .update_payment_status(PaymentStatus::Paid, Some(PaymentMethod::Cash), at(2026, 2, 20))
            .unwrap();
        assert_eq!(invoice.paid_at, Some(at(2026, 2, 20)));
        assert_eq!(invoice.payment_method, Some(PaymentMethod::Cash));

        invoice
            .update_payment_status(PaymentStatus::Paid, None, at(2026, 2, 21))
            .unwrap();
        assert_eq!(invoice.paid_at, Some(at(2026, 2, 20)));
    }

    #[test]
    fn test_paid_is_terminal() {
        let mut invoice = issue(&contract(dec!(50), 7, dec!(0)));
        invoice
            .update_payment_status(PaymentStatus::Paid, None, at(2026, 2, 20))
            .unwrap();

        let err = invoice
            .update_payment_status(PaymentStatus::Cancelled, None, at(2026, 2, 21))
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidTransition { from: "paid", to: "cancelled" }));
    }

    #[test]
    fn test_mark_overdue_only_after_due_date() {
        let mut invoice = issue(&contract(dec!(50), 7, dec!(0)));
        assert_eq!(invoice.due_date, date(2026, 3, 15));

        assert!(!invoice.mark_overdue_if_due(date(2026, 3, 15), at(2026, 3, 15)));
        assert!(invoice.mark_overdue_if_due(date(2026, 3, 16), at(2026, 3, 16)));
        assert_eq!(invoice.payment_status, PaymentStatus::Overdue);
        assert!(!invoice.mark_overdue_if_due(date(2026, 3, 17), at(2026, 3, 17)));

        invoice
            .update_payment_status(PaymentStatus::Paid, Some(PaymentMethod::BankTransfer), at(2026, 3, 18))
            .unwrap();
        assert!(!invoice.is_overdue(date(2026, 3, 20)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_subtotal_matches_amount_due(
        rate_cents in 1_000i64..50_000,
        days in 1u32..30,
        discount_pct in 0u32..50,
    ) {
        let rate = Decimal::new(rate_cents, 2);
        let total = round2(rate * Decimal::from(days));
        let discount = round2(total * Decimal::from(discount_pct) / dec!(100));
        let contract = contract(rate, days, discount);

        let draft = compile_invoice(&contract, &BillingConfig::default(), date(2026, 2, 3)).unwrap();
        prop_assert_eq!(draft.subtotal, contract.amount_due().unwrap());
        prop_assert_eq!(draft.tax_amount.amount(), round2(draft.subtotal.amount() * dec!(0.11)));
        prop_assert_eq!(
            draft.total_amount.amount(),
            draft.subtotal.amount() + draft.tax_amount.amount()
        );
    }
}
