//! Fleet repository implementation
//!
//! Vehicles and maintenance records. Mileage only moves forward: updates keep
//! the larger of the stored and the written odometer.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::DatabaseError;

const VEHICLE_COLUMNS: &str = r#"
    id, plate_number, brand, model, year, color, currency, daily_rate, weekly_rate,
    monthly_rate, mileage, status, insurance_cost, insurance_provider, insurance_policy_number,
    insurance_start_date, insurance_expiry_date, purchase_cost, next_maintenance_date,
    next_maintenance_km, created_at, updated_at
"#;

const MAINTENANCE_COLUMNS: &str = r#"
    id, vehicle_id, maintenance_type, description, cost, currency, performed_at,
    garage_entry_date, garage_exit_date, mileage_at_service, created_at
"#;

/// Repository for vehicles and their workshop visits
#[derive(Debug, Clone)]
pub struct FleetRepository {
    pool: PgPool,
}

impl FleetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a vehicle by identifier
    #[instrument(skip(self))]
    pub async fn get_vehicle(&self, id: Uuid) -> Result<VehicleRow, DatabaseError> {
        sqlx::query_as::<_, VehicleRow>(&format!("SELECT {} FROM vehicles WHERE id = $1", VEHICLE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Vehicle", id))
    }

    pub async fn list_vehicles(&self) -> Result<Vec<VehicleRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {} FROM vehicles ORDER BY plate_number",
            VEHICLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Inserts a vehicle; a taken plate number is a duplicate entry
    #[instrument(skip(self, row), fields(plate = %row.plate_number))]
    pub async fn insert_vehicle(&self, row: &VehicleRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (
                id, plate_number, brand, model, year, color, currency, daily_rate, weekly_rate,
                monthly_rate, mileage, status, insurance_cost, insurance_provider,
                insurance_policy_number, insurance_start_date, insurance_expiry_date, purchase_cost,
                next_maintenance_date, next_maintenance_km, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                $19, $20, $21, $22
            )
            "#,
        )
        .bind(row.id)
        .bind(&row.plate_number)
        .bind(&row.brand)
        .bind(&row.model)
        .bind(row.year)
        .bind(&row.color)
        .bind(&row.currency)
        .bind(row.daily_rate)
        .bind(row.weekly_rate)
        .bind(row.monthly_rate)
        .bind(row.mileage)
        .bind(&row.status)
        .bind(row.insurance_cost)
        .bind(&row.insurance_provider)
        .bind(&row.insurance_policy_number)
        .bind(row.insurance_start_date)
        .bind(row.insurance_expiry_date)
        .bind(row.purchase_cost)
        .bind(row.next_maintenance_date)
        .bind(row.next_maintenance_km)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrites the mutable fields of a vehicle
    #[instrument(skip(self, row), fields(vehicle_id = %row.id))]
    pub async fn update_vehicle(&self, row: &VehicleRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles SET
                plate_number = $2, brand = $3, model = $4, year = $5, color = $6,
                daily_rate = $7, weekly_rate = $8, monthly_rate = $9,
                mileage = GREATEST(mileage, $10), status = $11, insurance_cost = $12,
                purchase_cost = $13, next_maintenance_date = $14, next_maintenance_km = $15,
                insurance_provider = $16, insurance_policy_number = $17,
                insurance_start_date = $18, insurance_expiry_date = $19, updated_at = $20
            WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(&row.plate_number)
        .bind(&row.brand)
        .bind(&row.model)
        .bind(row.year)
        .bind(&row.color)
        .bind(row.daily_rate)
        .bind(row.weekly_rate)
        .bind(row.monthly_rate)
        .bind(row.mileage)
        .bind(&row.status)
        .bind(row.insurance_cost)
        .bind(row.purchase_cost)
        .bind(row.next_maintenance_date)
        .bind(row.next_maintenance_km)
        .bind(&row.insurance_provider)
        .bind(&row.insurance_policy_number)
        .bind(row.insurance_start_date)
        .bind(row.insurance_expiry_date)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Vehicle", row.id));
        }
        Ok(())
    }

    /// Inserts a maintenance record or replaces the one with the same id
    #[instrument(skip(self, row), fields(record_id = %row.id))]
    pub async fn upsert_maintenance(&self, row: &MaintenanceRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO maintenance_records (
                id, vehicle_id, maintenance_type, description, cost, currency, performed_at,
                garage_entry_date, garage_exit_date, mileage_at_service, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                maintenance_type = EXCLUDED.maintenance_type,
                description = EXCLUDED.description,
                cost = EXCLUDED.cost,
                performed_at = EXCLUDED.performed_at,
                garage_entry_date = EXCLUDED.garage_entry_date,
                garage_exit_date = EXCLUDED.garage_exit_date,
                mileage_at_service = EXCLUDED.mileage_at_service
            "#,
        )
        .bind(row.id)
        .bind(row.vehicle_id)
        .bind(&row.maintenance_type)
        .bind(&row.description)
        .bind(row.cost)
        .bind(&row.currency)
        .bind(row.performed_at)
        .bind(row.garage_entry_date)
        .bind(row.garage_exit_date)
        .bind(row.mileage_at_service)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_maintenance(&self, id: Uuid) -> Result<MaintenanceRow, DatabaseError> {
        sqlx::query_as::<_, MaintenanceRow>(&format!(
            "SELECT {} FROM maintenance_records WHERE id = $1",
            MAINTENANCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("MaintenanceRecord", id))
    }

    /// Lists records, optionally for one vehicle and a performed-at window
    pub async fn list_maintenance(
        &self,
        vehicle_id: Option<Uuid>,
        performed_from: Option<NaiveDate>,
        performed_to: Option<NaiveDate>,
    ) -> Result<Vec<MaintenanceRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, MaintenanceRow>(&format!(
            r#"
            SELECT {} FROM maintenance_records
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
              AND ($2::date IS NULL OR performed_at >= $2)
              AND ($3::date IS NULL OR performed_at <= $3)
            ORDER BY performed_at, created_at
            "#,
            MAINTENANCE_COLUMNS
        ))
        .bind(vehicle_id)
        .bind(performed_from)
        .bind(performed_to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Row in `vehicles`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VehicleRow {
    pub id: Uuid,
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub currency: String,
    pub daily_rate: Decimal,
    pub weekly_rate: Option<Decimal>,
    pub monthly_rate: Option<Decimal>,
    pub mileage: i64,
    pub status: String,
    pub insurance_cost: Decimal,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
    pub insurance_start_date: Option<NaiveDate>,
    pub insurance_expiry_date: Option<NaiveDate>,
    pub purchase_cost: Option<Decimal>,
    pub next_maintenance_date: Option<NaiveDate>,
    pub next_maintenance_km: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row in `maintenance_records`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MaintenanceRow {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub maintenance_type: String,
    pub description: String,
    pub cost: Decimal,
    pub currency: String,
    pub performed_at: NaiveDate,
    pub garage_entry_date: Option<NaiveDate>,
    pub garage_exit_date: Option<NaiveDate>,
    pub mileage_at_service: Option<i64>,
    pub created_at: DateTime<Utc>,
}
