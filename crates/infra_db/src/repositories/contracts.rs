//! Contract repository implementation
//!
//! Every write runs in a serializable transaction. Contract numbers come from
//! the `number_counters` row, so two concurrent creations can never share a
//! number: one of them fails to serialize and is reported as a conflict.
//! Updates are guarded by a compare-and-swap on `version`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::DatabaseError;

const CONTRACT_COLUMNS: &str = r#"
    id, contract_number, vehicle_id, client, rental_start, rental_end, rental_days, currency,
    daily_rate, total_amount, discount, final_amount, status, pickup_km, return_km, fuel_level,
    return_fuel_level, km_limit, over_limit_km_rate, over_limit_km_fee, late_fee, returned_at,
    damage_inspection, return_notes, version, created_at, updated_at
"#;

/// Name of the contract counter row
pub const CONTRACT_COUNTER: &str = "contract";

/// Repository for rental contracts and their child rows
#[derive(Debug, Clone)]
pub struct ContractRepository {
    pool: PgPool,
}

impl ContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new contract with its damage marks and marks the vehicle
    /// `Rented`, all in one transaction
    ///
    /// `build` receives the next contract counter value and returns the rows
    /// to write plus a value handed back to the caller.
    #[instrument(skip_all)]
    pub async fn insert_contract<F, T>(&self, build: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(i64) -> Result<(ContractWithMarks, T), DatabaseError> + Send,
        T: Send,
    {
        let mut tx = begin_serializable(&self.pool).await?;

        let sequence = next_number(&mut tx, CONTRACT_COUNTER).await?;
        let (ContractWithMarks { contract: row, marks }, output) = build(sequence)?;
        debug!(contract_number = %row.contract_number, "Assigned contract number");

        sqlx::query(&format!(
            "INSERT INTO rental_contracts ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
             $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)",
            CONTRACT_COLUMNS
        ))
        .bind(row.id)
        .bind(&row.contract_number)
        .bind(row.vehicle_id)
        .bind(&row.client)
        .bind(row.rental_start)
        .bind(row.rental_end)
        .bind(row.rental_days)
        .bind(&row.currency)
        .bind(row.daily_rate)
        .bind(row.total_amount)
        .bind(row.discount)
        .bind(row.final_amount)
        .bind(&row.status)
        .bind(row.pickup_km)
        .bind(row.return_km)
        .bind(&row.fuel_level)
        .bind(&row.return_fuel_level)
        .bind(row.km_limit)
        .bind(row.over_limit_km_rate)
        .bind(row.over_limit_km_fee)
        .bind(row.late_fee)
        .bind(row.returned_at)
        .bind(&row.damage_inspection)
        .bind(&row.return_notes)
        .bind(row.version)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await?;

        for mark in &marks {
            sqlx::query(
                r#"
                INSERT INTO damage_marks (id, contract_id, x, y, description, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(mark.id)
            .bind(row.id)
            .bind(mark.x)
            .bind(mark.y)
            .bind(&mark.description)
            .bind(mark.position)
            .execute(&mut *tx)
            .await?;
        }

        apply_vehicle_update(
            &mut tx,
            &VehicleUpdateRow {
                vehicle_id: row.vehicle_id,
                status: "Rented".to_string(),
                mileage: None,
            },
            row.created_at,
        )
        .await?;

        tx.commit().await?;
        Ok(output)
    }

    /// Writes a contract whose stored version still equals `expected_version`,
    /// together with vehicle updates and an optional amendment
    ///
    /// # Errors
    ///
    /// `DatabaseError::Conflict` if the version moved, `NotFound` if the
    /// contract is gone
    #[instrument(skip_all, fields(contract_id = %row.id, expected_version))]
    pub async fn commit(
        &self,
        row: &ContractRow,
        expected_version: i64,
        vehicle_updates: &[VehicleUpdateRow],
        amendment: Option<&AmendmentRow>,
    ) -> Result<(), DatabaseError> {
        let mut tx = begin_serializable(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE rental_contracts SET
                vehicle_id = $3, rental_end = $4, rental_days = $5, daily_rate = $6,
                total_amount = $7, discount = $8, final_amount = $9, status = $10,
                return_km = $11, return_fuel_level = $12, over_limit_km_rate = $13,
                over_limit_km_fee = $14, late_fee = $15, returned_at = $16,
                damage_inspection = $17, return_notes = $18, version = $19, updated_at = $20
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(row.id)
        .bind(expected_version)
        .bind(row.vehicle_id)
        .bind(row.rental_end)
        .bind(row.rental_days)
        .bind(row.daily_rate)
        .bind(row.total_amount)
        .bind(row.discount)
        .bind(row.final_amount)
        .bind(&row.status)
        .bind(row.return_km)
        .bind(&row.return_fuel_level)
        .bind(row.over_limit_km_rate)
        .bind(row.over_limit_km_fee)
        .bind(row.late_fee)
        .bind(row.returned_at)
        .bind(&row.damage_inspection)
        .bind(&row.return_notes)
        .bind(row.version)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT version FROM rental_contracts WHERE id = $1")
                .bind(row.id)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match exists {
                Some(found) => DatabaseError::Conflict(format!(
                    "contract {} is at version {}, expected {}",
                    row.contract_number, found, expected_version
                )),
                None => DatabaseError::not_found("Contract", row.id),
            });
        }

        for update in vehicle_updates {
            apply_vehicle_update(&mut tx, update, row.updated_at).await?;
        }

        if let Some(amendment) = amendment {
            sqlx::query(
                r#"
                INSERT INTO contract_amendments (
                    id, contract_id, amendment_type, reason, previous_values, new_values,
                    amount_difference, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(amendment.id)
            .bind(amendment.contract_id)
            .bind(&amendment.amendment_type)
            .bind(&amendment.reason)
            .bind(&amendment.previous_values)
            .bind(&amendment.new_values)
            .bind(amendment.amount_difference)
            .bind(amendment.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<ContractWithMarks, DatabaseError> {
        let row = sqlx::query_as::<_, ContractRow>(&format!(
            "SELECT {} FROM rental_contracts WHERE id = $1",
            CONTRACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Contract", id))?;
        self.with_marks(row).await
    }

    pub async fn get_by_number(&self, contract_number: &str) -> Result<ContractWithMarks, DatabaseError> {
        let row = sqlx::query_as::<_, ContractRow>(&format!(
            "SELECT {} FROM rental_contracts WHERE contract_number = $1",
            CONTRACT_COLUMNS
        ))
        .bind(contract_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Contract", contract_number))?;
        self.with_marks(row).await
    }

    /// Lists contracts ordered by rental start
    ///
    /// With `open_only`, contracts that were returned or explicitly completed
    /// are skipped.
    pub async fn list(&self, vehicle_id: Option<Uuid>, open_only: bool) -> Result<Vec<ContractWithMarks>, DatabaseError> {
        let rows = sqlx::query_as::<_, ContractRow>(&format!(
            r#"
            SELECT {} FROM rental_contracts
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
              AND (NOT $2 OR (returned_at IS NULL AND status IS DISTINCT FROM 'completed'))
            ORDER BY rental_start, contract_number
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(vehicle_id)
        .bind(open_only)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut marks = sqlx::query_as::<_, DamageMarkRow>(
            r#"
            SELECT id, contract_id, x, y, description, position FROM damage_marks
            WHERE contract_id = ANY($1)
            ORDER BY contract_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|contract| {
                let (own, rest): (Vec<_>, Vec<_>) = marks.drain(..).partition(|m| m.contract_id == contract.id);
                marks = rest;
                ContractWithMarks { contract, marks: own }
            })
            .collect())
    }

    pub async fn list_amendments(&self, contract_id: Uuid) -> Result<Vec<AmendmentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, AmendmentRow>(
            r#"
            SELECT id, contract_id, amendment_type, reason, previous_values, new_values,
                   amount_difference, created_at
            FROM contract_amendments
            WHERE contract_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn with_marks(&self, contract: ContractRow) -> Result<ContractWithMarks, DatabaseError> {
        let marks = sqlx::query_as::<_, DamageMarkRow>(
            r#"
            SELECT id, contract_id, x, y, description, position FROM damage_marks
            WHERE contract_id = $1
            ORDER BY position
            "#,
        )
        .bind(contract.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ContractWithMarks { contract, marks })
    }
}

/// Opens a transaction at `SERIALIZABLE` isolation
pub(crate) async fn begin_serializable(pool: &PgPool) -> Result<Transaction<'static, Postgres>, DatabaseError> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Increments and returns a named counter inside `tx`
pub(crate) async fn next_number(tx: &mut Transaction<'static, Postgres>, name: &str) -> Result<i64, DatabaseError> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO number_counters (name, last_value) VALUES ($1, 1)
        ON CONFLICT (name) DO UPDATE SET last_value = number_counters.last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;
    Ok(value)
}

async fn apply_vehicle_update(
    tx: &mut Transaction<'static, Postgres>,
    update: &VehicleUpdateRow,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE vehicles SET
            status = $2,
            mileage = GREATEST(mileage, COALESCE($3, mileage)),
            updated_at = $4
        WHERE id = $1
        "#,
    )
    .bind(update.vehicle_id)
    .bind(&update.status)
    .bind(update.mileage)
    .bind(at)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Vehicle", update.vehicle_id));
    }
    Ok(())
}

/// Row in `rental_contracts`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContractRow {
    pub id: Uuid,
    pub contract_number: String,
    pub vehicle_id: Uuid,
    /// Snapshot of the client fields
    pub client: Value,
    pub rental_start: DateTime<Utc>,
    pub rental_end: DateTime<Utc>,
    pub rental_days: i32,
    pub currency: String,
    pub daily_rate: Decimal,
    pub total_amount: Decimal,
    pub discount: Decimal,
    pub final_amount: Decimal,
    pub status: Option<String>,
    pub pickup_km: Option<i64>,
    pub return_km: Option<i64>,
    pub fuel_level: Option<String>,
    pub return_fuel_level: Option<String>,
    pub km_limit: Option<i64>,
    pub over_limit_km_rate: Option<Decimal>,
    pub over_limit_km_fee: Decimal,
    pub late_fee: Decimal,
    pub returned_at: Option<DateTime<Utc>>,
    pub damage_inspection: Option<String>,
    pub return_notes: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row in `damage_marks`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DamageMarkRow {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub x: Decimal,
    pub y: Decimal,
    pub description: String,
    pub position: i32,
}

/// Row in `contract_amendments`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AmendmentRow {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub amendment_type: String,
    pub reason: String,
    pub previous_values: Value,
    pub new_values: Value,
    pub amount_difference: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Vehicle status flip written with a contract
#[derive(Debug, Clone)]
pub struct VehicleUpdateRow {
    pub vehicle_id: Uuid,
    pub status: String,
    pub mileage: Option<i64>,
}

/// A contract row with its damage marks in diagram order
#[derive(Debug, Clone)]
pub struct ContractWithMarks {
    pub contract: ContractRow,
    pub marks: Vec<DamageMarkRow>,
}
