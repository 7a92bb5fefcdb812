//! Billing domain services

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use core_kernel::{Clock, ContractId, InvoiceId};
use domain_rental::{ContractPort, RentalError, RentalService, SettlementRequest, SettlementResult};

use crate::compiler::{compile_invoice, BillingConfig};
use crate::error::BillingError;
use crate::invoice::Invoice;
use crate::payment::{PaymentMethod, PaymentStatus};
use crate::ports::{InvoicePort, InvoiceQuery};

/// Result of issuing an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedInvoice {
    pub invoice: Invoice,
    /// False when the contract already had an invoice and it was returned as is
    pub created: bool,
}

/// A settled return and the invoice it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettledReturn {
    pub settlement: SettlementResult,
    pub invoice: IssuedInvoice,
}

/// Service for invoice issue and payment tracking
pub struct InvoiceService {
    invoices: Arc<dyn InvoicePort>,
    contracts: Arc<dyn ContractPort>,
    clock: Arc<dyn Clock>,
    config: BillingConfig,
}

impl InvoiceService {
    pub fn new(invoices: Arc<dyn InvoicePort>, contracts: Arc<dyn ContractPort>, clock: Arc<dyn Clock>) -> Self {
        Self {
            invoices,
            contracts,
            clock,
            config: BillingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BillingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Issues the invoice for a settled contract, dated today
    ///
    /// A contract has at most one invoice; asking again returns the stored
    /// one unchanged, with its original figures and exchange rate. Open
    /// contracts are refused, since their fees are not final until the
    /// return is recorded.
    #[instrument(skip(self))]
    pub async fn issue_for_contract(&self, contract_id: ContractId) -> Result<IssuedInvoice, BillingError> {
        let contract = self.contracts.get_contract(contract_id).await.map_err(|e| {
            if e.is_not_found() {
                RentalError::contract_not_found(contract_id).into()
            } else {
                BillingError::from(e)
            }
        })?;
        if !contract.is_completed() {
            return Err(BillingError::validation(format!(
                "contract {} is still open; it is invoiced when the vehicle is returned",
                contract.contract_number()
            )));
        }

        if let Some(invoice) = self.invoices.get_for_contract(contract_id).await? {
            debug!(invoice = %invoice.invoice_number, "Invoice already issued");
            return Ok(IssuedInvoice { invoice, created: false });
        }

        let now = self.clock.now();
        let draft = compile_invoice(&contract, &self.config, now.date_naive())?;
        let (invoice, created) = self.invoices.create_if_absent(draft, now).await?;
        if created {
            info!(
                invoice = %invoice.invoice_number,
                contract = %invoice.contract_number,
                total = %invoice.total_amount,
                "Invoice issued"
            );
        }
        Ok(IssuedInvoice { invoice, created })
    }

    /// Records the return through `rental`, then issues the invoice
    ///
    /// The settlement is committed first. If invoicing then fails the
    /// contract stays settled and `issue_for_contract` can be called again.
    #[instrument(skip(self, rental, request))]
    pub async fn settle_and_invoice(
        &self,
        rental: &RentalService,
        contract_id: ContractId,
        request: SettlementRequest,
    ) -> Result<SettledReturn, BillingError> {
        let settlement = rental.settle_contract(contract_id, request).await?;
        let invoice = self.issue_for_contract(contract_id).await?;
        Ok(SettledReturn { settlement, invoice })
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.invoices.get_invoice(id).await.map_err(|e| {
            if e.is_not_found() {
                BillingError::InvoiceNotFound(id.to_string())
            } else {
                e.into()
            }
        })
    }

    pub async fn get_for_contract(&self, contract_id: ContractId) -> Result<Invoice, BillingError> {
        self.invoices
            .get_for_contract(contract_id)
            .await?
            .ok_or_else(|| BillingError::InvoiceNotFound(format!("contract {}", contract_id)))
    }

    pub async fn list_invoices(&self, query: InvoiceQuery) -> Result<Vec<Invoice>, BillingError> {
        Ok(self.invoices.list_invoices(query).await?)
    }

    /// Moves an invoice along the payment state machine
    #[instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        id: InvoiceId,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
    ) -> Result<Invoice, BillingError> {
        let mut invoice = self.get_invoice(id).await?;
        let previous = invoice.payment_status;
        invoice.update_payment_status(status, method, self.clock.now())?;
        self.invoices.update_invoice(&invoice).await?;

        info!(
            invoice = %invoice.invoice_number,
            from = previous.as_str(),
            to = status.as_str(),
            "Payment status updated"
        );
        Ok(invoice)
    }

    /// Flags every pending invoice past its due date as overdue
    ///
    /// Returns the invoices that changed.
    #[instrument(skip(self))]
    pub async fn mark_overdue_invoices(&self) -> Result<Vec<Invoice>, BillingError> {
        let now = self.clock.now();
        let today = now.date_naive();
        let pending = self
            .invoices
            .list_invoices(InvoiceQuery::all().with_status(PaymentStatus::Pending))
            .await?;

        let mut changed = Vec::new();
        for mut invoice in pending {
            if invoice.mark_overdue_if_due(today, now) {
                self.invoices.update_invoice(&invoice).await?;
                changed.push(invoice);
            }
        }
        if !changed.is_empty() {
            info!(count = changed.len(), "Invoices marked overdue");
        }
        Ok(changed)
    }
}
