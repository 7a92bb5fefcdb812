//! Invoice DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_billing::{Invoice, PaymentMethod, PaymentStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentUpdateRequest {
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListQuery {
    pub status: Option<PaymentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Issue result; `created` is false when the contract was already invoiced
#[derive(Debug, Serialize)]
pub struct IssueInvoiceResponse {
    pub created: bool,
    pub invoice: Invoice,
}

#[derive(Debug, Serialize)]
pub struct OverdueSweepResponse {
    pub marked: usize,
    pub invoices: Vec<Invoice>,
}
