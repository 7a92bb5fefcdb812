//! Billing Domain - Invoices for rental contracts
//!
//! This crate turns a contract's figures into an invoice and tracks its
//! payment.
//!
//! # Invoice figures
//!
//! - Line items reproduce the contract: rental, KM overage, late return and
//!   discount, and must add up to the amount due
//! - Tax is VAT on the subtotal, rounded to cents
//! - A secondary-currency projection is computed at issue and frozen with the
//!   exchange rate used
//!
//! # Payment status
//!
//! `pending → paid | overdue | cancelled`, `overdue → paid | cancelled`.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{compile_invoice, BillingConfig};
//!
//! let draft = compile_invoice(&contract, &BillingConfig::default(), today)?;
//! assert_eq!(draft.subtotal, contract.amount_due()?);
//! ```

pub mod invoice;
pub mod payment;
pub mod compiler;
pub mod settings;
pub mod ports;
pub mod services;
pub mod error;

pub use invoice::{
    CurrencyProjection, Invoice, InvoiceDraft, InvoiceLineItem, LineItemKind,
    format_invoice_number, parse_invoice_sequence,
};
pub use payment::{PaymentMethod, PaymentStatus};
pub use compiler::{BillingConfig, compile_invoice};
pub use settings::{
    CountryFinancialSettings, DEFAULT_LBP_RATE, DEFAULT_VAT_PERCENT, financial_settings, vat_percent,
};
pub use ports::{InvoicePort, InvoiceQuery};
pub use services::{InvoiceService, IssuedInvoice, SettledReturn};
pub use error::BillingError;
