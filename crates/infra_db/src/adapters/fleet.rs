//! PostgreSQL Fleet Adapter
//!
//! Implements [`FleetPort`] on top of [`FleetRepository`].

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, MaintenanceRecordId, PortError, VehicleId,
};
use domain_fleet::{
    FleetPort, InsurancePolicy, MaintenanceQuery, MaintenanceRecord, MaintenanceType, Vehicle, VehicleStatus,
};

use crate::adapters::{currency, money, parse_column, ping};
use crate::error::DatabaseError;
use crate::repositories::fleet::{FleetRepository, MaintenanceRow, VehicleRow};

/// PostgreSQL-backed implementation of [`FleetPort`]
#[derive(Debug, Clone)]
pub struct PostgresFleetAdapter {
    repository: FleetRepository,
    pool: PgPool,
}

impl PostgresFleetAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: FleetRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &FleetRepository {
        &self.repository
    }
}

impl DomainPort for PostgresFleetAdapter {}

#[async_trait]
impl HealthCheckable for PostgresFleetAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-fleet-adapter").await
    }
}

#[async_trait]
impl FleetPort for PostgresFleetAdapter {
    #[instrument(skip(self), fields(vehicle_id = %id))]
    async fn get_vehicle(&self, id: VehicleId) -> Result<Vehicle, PortError> {
        let row = self.repository.get_vehicle(id.into()).await?;
        Ok(row_to_vehicle(row)?)
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, PortError> {
        let rows = self.repository.list_vehicles().await?;
        debug!(count = rows.len(), "Loaded vehicles");
        rows.into_iter()
            .map(|row| row_to_vehicle(row).map_err(PortError::from))
            .collect()
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), PortError> {
        self.repository.insert_vehicle(&vehicle_to_row(vehicle)).await?;
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), PortError> {
        self.repository.update_vehicle(&vehicle_to_row(vehicle)).await?;
        Ok(())
    }

    async fn save_maintenance(&self, record: &MaintenanceRecord) -> Result<(), PortError> {
        self.repository.upsert_maintenance(&maintenance_to_row(record)).await?;
        Ok(())
    }

    async fn get_maintenance(&self, id: MaintenanceRecordId) -> Result<MaintenanceRecord, PortError> {
        let row = self.repository.get_maintenance(id.into()).await?;
        Ok(row_to_maintenance(row)?)
    }

    #[instrument(skip(self))]
    async fn list_maintenance(&self, query: MaintenanceQuery) -> Result<Vec<MaintenanceRecord>, PortError> {
        let rows = self
            .repository
            .list_maintenance(
                query.vehicle_id.map(Into::into),
                query.performed_within.map(|w| w.start),
                query.performed_within.map(|w| w.end),
            )
            .await?;
        rows.into_iter()
            .map(|row| row_to_maintenance(row).map_err(PortError::from))
            .collect()
    }
}

fn vehicle_to_row(vehicle: &Vehicle) -> VehicleRow {
    let policy = vehicle.insurance.as_ref();
    VehicleRow {
        id: vehicle.id.into(),
        plate_number: vehicle.plate_number.clone(),
        brand: vehicle.brand.clone(),
        model: vehicle.model.clone(),
        year: vehicle.year,
        color: vehicle.color.clone(),
        currency: vehicle.currency().code().to_string(),
        daily_rate: vehicle.daily_rate.amount(),
        weekly_rate: vehicle.weekly_rate.map(|m| m.amount()),
        monthly_rate: vehicle.monthly_rate.map(|m| m.amount()),
        mileage: vehicle.mileage,
        status: vehicle.status.as_str().to_string(),
        insurance_cost: vehicle.insurance_cost.amount(),
        insurance_provider: policy.and_then(|p| p.provider.clone()),
        insurance_policy_number: policy.and_then(|p| p.policy_number.clone()),
        insurance_start_date: policy.and_then(|p| p.start_date),
        insurance_expiry_date: policy.map(|p| p.expiry_date),
        purchase_cost: vehicle.purchase_cost.map(|m| m.amount()),
        next_maintenance_date: vehicle.next_maintenance_date,
        next_maintenance_km: vehicle.next_maintenance_km,
        created_at: vehicle.created_at,
        updated_at: vehicle.updated_at,
    }
}

fn row_to_vehicle(row: VehicleRow) -> Result<Vehicle, DatabaseError> {
    let ccy = currency(&row.currency)?;
    let insurance = row.insurance_expiry_date.map(|expiry_date| InsurancePolicy {
        provider: row.insurance_provider,
        policy_number: row.insurance_policy_number,
        start_date: row.insurance_start_date,
        expiry_date,
    });
    Ok(Vehicle {
        id: VehicleId::from_uuid(row.id),
        plate_number: row.plate_number,
        brand: row.brand,
        model: row.model,
        year: row.year,
        color: row.color,
        daily_rate: money(row.daily_rate, ccy),
        weekly_rate: row.weekly_rate.map(|a| money(a, ccy)),
        monthly_rate: row.monthly_rate.map(|a| money(a, ccy)),
        mileage: row.mileage,
        status: parse_column("vehicle status", &row.status, VehicleStatus::parse)?,
        insurance_cost: money(row.insurance_cost, ccy),
        insurance,
        purchase_cost: row.purchase_cost.map(|a| money(a, ccy)),
        next_maintenance_date: row.next_maintenance_date,
        next_maintenance_km: row.next_maintenance_km,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn maintenance_to_row(record: &MaintenanceRecord) -> MaintenanceRow {
    MaintenanceRow {
        id: record.id.into(),
        vehicle_id: record.vehicle_id.into(),
        maintenance_type: record.maintenance_type.as_str().to_string(),
        description: record.description.clone(),
        cost: record.cost.amount(),
        currency: record.cost.currency().code().to_string(),
        performed_at: record.performed_at,
        garage_entry_date: record.garage_entry_date,
        garage_exit_date: record.garage_exit_date,
        mileage_at_service: record.mileage_at_service,
        created_at: record.created_at,
    }
}

fn row_to_maintenance(row: MaintenanceRow) -> Result<MaintenanceRecord, DatabaseError> {
    Ok(MaintenanceRecord {
        id: MaintenanceRecordId::from_uuid(row.id),
        vehicle_id: VehicleId::from_uuid(row.vehicle_id),
        maintenance_type: parse_column("maintenance type", &row.maintenance_type, MaintenanceType::parse)?,
        description: row.description,
        cost: money(row.cost, currency(&row.currency)?),
        performed_at: row.performed_at,
        garage_entry_date: row.garage_entry_date,
        garage_exit_date: row.garage_exit_date,
        mileage_at_service: row.mileage_at_service,
        created_at: row.created_at,
    })
}
