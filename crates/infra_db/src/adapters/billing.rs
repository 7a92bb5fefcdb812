//! PostgreSQL Invoice Adapter
//!
//! Implements [`InvoicePort`] on top of [`InvoiceRepository`]. Two callers
//! racing to invoice the same contract both end up with the single stored
//! invoice: the loser's transaction fails on the unique `contract_id` (or on
//! serialization) and the adapter reads back the winner's row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use core_kernel::{
    ContractId, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, LineItemId, PortError, Rate,
};
use domain_billing::{
    format_invoice_number, CurrencyProjection, Invoice, InvoiceDraft, InvoiceLineItem, InvoicePort, InvoiceQuery,
    LineItemKind, PaymentMethod, PaymentStatus,
};

use crate::adapters::{currency, money, parse_column, ping};
use crate::error::DatabaseError;
use crate::repositories::invoices::{InvoiceRepository, InvoiceRow, InvoiceWithLines, LineItemRow};

/// PostgreSQL-backed implementation of [`InvoicePort`]
#[derive(Debug, Clone)]
pub struct PostgresInvoiceAdapter {
    repository: InvoiceRepository,
    pool: PgPool,
}

impl PostgresInvoiceAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: InvoiceRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &InvoiceRepository {
        &self.repository
    }
}

impl DomainPort for PostgresInvoiceAdapter {}

#[async_trait]
impl HealthCheckable for PostgresInvoiceAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-invoice-adapter").await
    }
}

#[async_trait]
impl InvoicePort for PostgresInvoiceAdapter {
    #[instrument(skip(self, draft), fields(contract_number = %draft.contract_number))]
    async fn create_if_absent(
        &self,
        draft: InvoiceDraft,
        created_at: DateTime<Utc>,
    ) -> Result<(Invoice, bool), PortError> {
        let contract_id = draft.contract_id;
        let result = self
            .repository
            .create_if_absent(contract_id.into(), move |sequence| {
                invoice_to_rows(&Invoice::from_draft(format_invoice_number(sequence), draft, created_at))
            })
            .await;

        match result {
            Ok((stored, created)) => Ok((rows_to_invoice(stored)?, created)),
            Err(DatabaseError::DuplicateEntry(_)) | Err(DatabaseError::Conflict(_)) => {
                warn!("Lost invoice race, reading the stored invoice");
                match self.repository.get_for_contract(contract_id.into()).await? {
                    Some(stored) => Ok((rows_to_invoice(stored)?, false)),
                    None => Err(PortError::conflict(format!(
                        "invoice for contract {} could not be written",
                        contract_id
                    ))),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        let stored = self.repository.get(id.into()).await?;
        Ok(rows_to_invoice(stored)?)
    }

    async fn get_for_contract(&self, contract_id: ContractId) -> Result<Option<Invoice>, PortError> {
        match self.repository.get_for_contract(contract_id.into()).await? {
            Some(stored) => Ok(Some(rows_to_invoice(stored)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_invoices(&self, query: InvoiceQuery) -> Result<Vec<Invoice>, PortError> {
        let stored = self
            .repository
            .list(
                query.payment_status.map(|s| s.as_str()),
                query.issued_within.map(|w| w.start),
                query.issued_within.map(|w| w.end),
            )
            .await?;
        debug!(count = stored.len(), "Loaded invoices");
        stored
            .into_iter()
            .map(|s| rows_to_invoice(s).map_err(PortError::from))
            .collect()
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        let rows = invoice_to_rows(invoice);
        self.repository.update_payment(&rows.invoice).await?;
        Ok(())
    }
}

fn invoice_to_rows(invoice: &Invoice) -> InvoiceWithLines {
    let row = InvoiceRow {
        id: invoice.id.into(),
        invoice_number: invoice.invoice_number.clone(),
        contract_id: invoice.contract_id.into(),
        contract_number: invoice.contract_number.clone(),
        client_name: invoice.client_name.clone(),
        invoice_date: invoice.invoice_date,
        due_date: invoice.due_date,
        currency: invoice.currency.code().to_string(),
        subtotal: invoice.subtotal.amount(),
        tax_rate: invoice.tax_rate.as_decimal(),
        tax_amount: invoice.tax_amount.amount(),
        total_amount: invoice.total_amount.amount(),
        secondary_currency: invoice.projection.currency.code().to_string(),
        exchange_rate: invoice.projection.exchange_rate,
        secondary_subtotal: invoice.projection.subtotal.amount(),
        secondary_tax_amount: invoice.projection.tax_amount.amount(),
        secondary_total: invoice.projection.total_amount.amount(),
        payment_status: invoice.payment_status.as_str().to_string(),
        payment_method: invoice.payment_method.map(|m| m.as_str().to_string()),
        paid_at: invoice.paid_at,
        notes: invoice.notes.clone(),
        created_at: invoice.created_at,
        updated_at: invoice.updated_at,
    };

    let lines = invoice
        .line_items
        .iter()
        .zip(0i32..)
        .map(|(line, position)| LineItemRow {
            id: line.id.into(),
            invoice_id: invoice.id.into(),
            position,
            kind: line.kind.as_str().to_string(),
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.amount(),
            amount: line.amount.amount(),
        })
        .collect();

    InvoiceWithLines { invoice: row, lines }
}

fn rows_to_invoice(stored: InvoiceWithLines) -> Result<Invoice, DatabaseError> {
    let InvoiceWithLines { invoice: row, lines } = stored;
    let ccy = currency(&row.currency)?;
    let secondary = currency(&row.secondary_currency)?;

    let line_items = lines
        .into_iter()
        .map(|line| {
            Ok(InvoiceLineItem {
                id: LineItemId::from_uuid(line.id),
                kind: parse_column("line item kind", &line.kind, LineItemKind::parse)?,
                description: line.description,
                quantity: line.quantity,
                unit_price: money(line.unit_price, ccy),
                amount: money(line.amount, ccy),
            })
        })
        .collect::<Result<Vec<_>, DatabaseError>>()?;

    let payment_method = row
        .payment_method
        .as_deref()
        .map(|m| parse_column("payment method", m, PaymentMethod::parse))
        .transpose()?;

    Ok(Invoice {
        id: InvoiceId::from_uuid(row.id),
        invoice_number: row.invoice_number,
        contract_id: ContractId::from_uuid(row.contract_id),
        contract_number: row.contract_number,
        client_name: row.client_name,
        invoice_date: row.invoice_date,
        due_date: row.due_date,
        currency: ccy,
        line_items,
        subtotal: money(row.subtotal, ccy),
        tax_rate: Rate::new(row.tax_rate),
        tax_amount: money(row.tax_amount, ccy),
        total_amount: money(row.total_amount, ccy),
        projection: CurrencyProjection {
            currency: secondary,
            exchange_rate: row.exchange_rate,
            subtotal: money(row.secondary_subtotal, secondary),
            tax_amount: money(row.secondary_tax_amount, secondary),
            total_amount: money(row.secondary_total, secondary),
        },
        payment_status: parse_column("payment status", &row.payment_status, PaymentStatus::parse)?,
        payment_method,
        paid_at: row.paid_at,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    fn invoice() -> Invoice {
        let currency = Currency::USD;
        let line = InvoiceLineItem::new(LineItemKind::Rental, "Rental (7 days)", dec!(7), Money::usd(dec!(50)));
        let draft = InvoiceDraft {
            contract_id: ContractId::new(),
            contract_number: "CTR-009".to_string(),
            client_name: "Omar Saad".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            currency,
            line_items: vec![line],
            subtotal: Money::usd(dec!(350)),
            tax_rate: Rate::new(dec!(0.11)),
            tax_amount: Money::usd(dec!(38.50)),
            total_amount: Money::usd(dec!(388.50)),
            projection: CurrencyProjection {
                currency: Currency::LBP,
                exchange_rate: dec!(89700),
                subtotal: Money::new(dec!(31395000), Currency::LBP),
                tax_amount: Money::new(dec!(3453450), Currency::LBP),
                total_amount: Money::new(dec!(34848450), Currency::LBP),
            },
            notes: None,
        };
        Invoice::from_draft("INV-00012", draft, Utc::now())
    }

    #[test]
    fn test_invoice_rows_round_trip() {
        let mut original = invoice();
        original
            .update_payment_status(PaymentStatus::Paid, Some(PaymentMethod::Cash), Utc::now())
            .unwrap();

        let rows = invoice_to_rows(&original);
        assert_eq!(rows.invoice.payment_status, "paid");
        assert_eq!(rows.invoice.secondary_currency, "LBP");
        assert_eq!(rows.lines[0].kind, "rental");

        assert_eq!(rows_to_invoice(rows).unwrap(), original);
    }

    #[test]
    fn test_unknown_payment_status_is_corrupt_row() {
        let mut rows = invoice_to_rows(&invoice());
        rows.invoice.payment_status = "refunded".to_string();
        assert!(matches!(rows_to_invoice(rows), Err(DatabaseError::CorruptRow(_))));
    }
}
