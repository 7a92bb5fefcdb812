//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_billing::Invoice;
use domain_rental::RentalContract;
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts the stored price fields of a contract agree with each other
///
/// `total = daily_rate * rental_days`, `final = max(total - discount, 0)`
/// and the rental end is never before the start.
pub fn assert_contract_consistent(contract: &RentalContract) {
    let expected_total = contract.daily_rate().multiply(Decimal::from(contract.rental_days())).round2();
    assert_eq!(
        contract.total_amount().amount(),
        expected_total.amount(),
        "{}: total {} != {} x {} days",
        contract.contract_number(),
        contract.total_amount(),
        contract.daily_rate(),
        contract.rental_days()
    );

    let expected_final = contract
        .total_amount()
        .checked_sub(&contract.discount())
        .map(|m| m.floor_zero())
        .expect("contract amounts share a currency");
    assert_eq!(
        contract.final_amount().amount(),
        expected_final.amount(),
        "{}: final amount does not match total less discount",
        contract.contract_number()
    );

    assert!(
        contract.rental_end() >= contract.rental_start(),
        "{}: rental ends before it starts",
        contract.contract_number()
    );
}

/// Asserts an invoice's lines add up to its subtotal and the total is subtotal plus tax
pub fn assert_invoice_reconciles(invoice: &Invoice) {
    let lines = Money::sum(invoice.currency, invoice.line_items.iter().map(|l| &l.amount))
        .expect("line items share the invoice currency");
    assert_eq!(
        lines.round2().amount(),
        invoice.subtotal.round2().amount(),
        "{}: line items sum to {}, subtotal is {}",
        invoice.invoice_number,
        lines,
        invoice.subtotal
    );

    let total = invoice
        .subtotal
        .checked_add(&invoice.tax_amount)
        .expect("tax shares the invoice currency");
    assert_eq!(
        total.round2().amount(),
        invoice.total_amount.round2().amount(),
        "{}: subtotal plus tax is {}, total is {}",
        invoice.invoice_number,
        total,
        invoice.total_amount
    );
}
