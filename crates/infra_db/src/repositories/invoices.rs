//! Invoice repository implementation
//!
//! One invoice per contract, enforced by the unique `contract_id` column.
//! Invoice numbers come from the `invoice` counter inside the inserting
//! transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::repositories::contracts::{begin_serializable, next_number};

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, contract_id, contract_number, client_name, invoice_date, due_date,
    currency, subtotal, tax_rate, tax_amount, total_amount, secondary_currency, exchange_rate,
    secondary_subtotal, secondary_tax_amount, secondary_total, payment_status, payment_method,
    paid_at, notes, created_at, updated_at
"#;

/// Name of the invoice counter row
pub const INVOICE_COUNTER: &str = "invoice";

/// Repository for invoices and their line items
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the invoice built by `build` unless the contract already has one
    ///
    /// `build` receives the next counter value and is only called when a new
    /// invoice is written. Returns the stored invoice and whether it is new.
    #[instrument(skip(self, build), fields(contract_id = %contract_id))]
    pub async fn create_if_absent<F>(
        &self,
        contract_id: Uuid,
        build: F,
    ) -> Result<(InvoiceWithLines, bool), DatabaseError>
    where
        F: FnOnce(i64) -> InvoiceWithLines + Send,
    {
        let mut tx = begin_serializable(&self.pool).await?;

        let existing = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {} FROM invoices WHERE contract_id = $1",
            INVOICE_COLUMNS
        ))
        .bind(contract_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(invoice) = existing {
            tx.rollback().await?;
            debug!(invoice_number = %invoice.invoice_number, "Contract already invoiced");
            let stored = self.with_lines(invoice).await?;
            return Ok((stored, false));
        }

        let sequence = next_number(&mut tx, INVOICE_COUNTER).await?;
        let new = build(sequence);
        let row = &new.invoice;

        sqlx::query(&format!(
            "INSERT INTO invoices ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
             $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)",
            INVOICE_COLUMNS
        ))
        .bind(row.id)
        .bind(&row.invoice_number)
        .bind(row.contract_id)
        .bind(&row.contract_number)
        .bind(&row.client_name)
        .bind(row.invoice_date)
        .bind(row.due_date)
        .bind(&row.currency)
        .bind(row.subtotal)
        .bind(row.tax_rate)
        .bind(row.tax_amount)
        .bind(row.total_amount)
        .bind(&row.secondary_currency)
        .bind(row.exchange_rate)
        .bind(row.secondary_subtotal)
        .bind(row.secondary_tax_amount)
        .bind(row.secondary_total)
        .bind(&row.payment_status)
        .bind(&row.payment_method)
        .bind(row.paid_at)
        .bind(&row.notes)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in &new.lines {
            sqlx::query(
                r#"
                INSERT INTO invoice_line_items (
                    id, invoice_id, position, kind, description, quantity, unit_price, amount
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(line.id)
            .bind(row.id)
            .bind(line.position)
            .bind(&line.kind)
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((new, true))
    }

    pub async fn get(&self, id: Uuid) -> Result<InvoiceWithLines, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {} FROM invoices WHERE id = $1",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", id))?;
        self.with_lines(row).await
    }

    pub async fn get_for_contract(&self, contract_id: Uuid) -> Result<Option<InvoiceWithLines>, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {} FROM invoices WHERE contract_id = $1",
            INVOICE_COLUMNS
        ))
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.with_lines(row).await?)),
            None => Ok(None),
        }
    }

    /// Lists invoices newest first, optionally by status and invoice date
    pub async fn list(
        &self,
        payment_status: Option<&str>,
        issued_from: Option<NaiveDate>,
        issued_to: Option<NaiveDate>,
    ) -> Result<Vec<InvoiceWithLines>, DatabaseError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            SELECT {} FROM invoices
            WHERE ($1::text IS NULL OR payment_status = $1)
              AND ($2::date IS NULL OR invoice_date >= $2)
              AND ($3::date IS NULL OR invoice_date <= $3)
            ORDER BY invoice_date DESC, invoice_number DESC
            "#,
            INVOICE_COLUMNS
        ))
        .bind(payment_status)
        .bind(issued_from)
        .bind(issued_to)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut lines = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT id, invoice_id, position, kind, description, quantity, unit_price, amount
            FROM invoice_line_items
            WHERE invoice_id = ANY($1)
            ORDER BY invoice_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|invoice| {
                let (own, rest): (Vec<_>, Vec<_>) = lines.drain(..).partition(|l| l.invoice_id == invoice.id);
                lines = rest;
                InvoiceWithLines { invoice, lines: own }
            })
            .collect())
    }

    /// Writes the payment fields of an invoice
    #[instrument(skip(self, row), fields(invoice_number = %row.invoice_number))]
    pub async fn update_payment(&self, row: &InvoiceRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                payment_status = $2, payment_method = $3, paid_at = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(&row.payment_status)
        .bind(&row.payment_method)
        .bind(row.paid_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", row.id));
        }
        Ok(())
    }

    async fn with_lines(&self, invoice: InvoiceRow) -> Result<InvoiceWithLines, DatabaseError> {
        let lines = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT id, invoice_id, position, kind, description, quantity, unit_price, amount
            FROM invoice_line_items
            WHERE invoice_id = $1
            ORDER BY position
            "#,
        )
        .bind(invoice.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(InvoiceWithLines { invoice, lines })
    }
}

/// Row in `invoices`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub contract_id: Uuid,
    pub contract_number: String,
    pub client_name: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub secondary_currency: String,
    pub exchange_rate: Decimal,
    pub secondary_subtotal: Decimal,
    pub secondary_tax_amount: Decimal,
    pub secondary_total: Decimal,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row in `invoice_line_items`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LineItemRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub position: i32,
    pub kind: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

/// An invoice row with its lines in print order
#[derive(Debug, Clone)]
pub struct InvoiceWithLines {
    pub invoice: InvoiceRow,
    pub lines: Vec<LineItemRow>,
}
