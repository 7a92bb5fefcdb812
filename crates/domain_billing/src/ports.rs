//! Billing Domain Ports

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{ContractId, DateRange, DomainPort, InvoiceId, PortError};

use crate::invoice::{Invoice, InvoiceDraft};
use crate::payment::PaymentStatus;

/// Filter for listing invoices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvoiceQuery {
    pub payment_status: Option<PaymentStatus>,
    /// Invoice date falls inside this window
    pub issued_within: Option<DateRange>,
}

impl InvoiceQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    pub fn issued_within(mut self, window: DateRange) -> Self {
        self.issued_within = Some(window);
        self
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.payment_status.map_or(true, |s| invoice.payment_status == s)
            && self
                .issued_within
                .map_or(true, |w| w.contains(invoice.invoice_date))
    }
}

/// Storage operations the billing domain needs
#[async_trait]
pub trait InvoicePort: DomainPort {
    /// Stores the draft under the next invoice number unless the contract
    /// already has an invoice
    ///
    /// Returns the stored invoice and whether it was created by this call.
    async fn create_if_absent(
        &self,
        draft: InvoiceDraft,
        created_at: DateTime<Utc>,
    ) -> Result<(Invoice, bool), PortError>;

    /// Retrieves an invoice, or `PortError::NotFound`
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// The invoice issued for a contract, if any
    async fn get_for_contract(&self, contract_id: ContractId) -> Result<Option<Invoice>, PortError>;

    /// Lists invoices matching the query, newest invoice date first
    async fn list_invoices(&self, query: InvoiceQuery) -> Result<Vec<Invoice>, PortError>;

    /// Persists payment fields of an existing invoice
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PortError>;
}
