//! Fleet domain services

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use core_kernel::{Clock, MaintenanceRecordId, VehicleId};

use crate::alerts::{maintenance_alerts, AlertThresholds, MaintenanceAlert};
use crate::error::FleetError;
use crate::insurance::{expired_insurance, expiring_insurance, InsuranceAlert, InsuranceRenewal};
use crate::maintenance::MaintenanceRecord;
use crate::ports::{FleetPort, MaintenanceQuery};
use crate::vehicle::{Vehicle, VehicleStatus};

/// Service for vehicle registration, workshop visits and service alerts
pub struct FleetService {
    fleet: Arc<dyn FleetPort>,
    clock: Arc<dyn Clock>,
    thresholds: AlertThresholds,
}

impl FleetService {
    pub fn new(fleet: Arc<dyn FleetPort>, clock: Arc<dyn Clock>) -> Self {
        Self {
            fleet,
            clock,
            thresholds: AlertThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Adds a vehicle to the fleet
    #[instrument(skip(self, vehicle), fields(plate = %vehicle.plate_number))]
    pub async fn register_vehicle(&self, vehicle: Vehicle) -> Result<Vehicle, FleetError> {
        vehicle.validate_rates()?;
        self.fleet.insert_vehicle(&vehicle).await?;
        info!(vehicle_id = %vehicle.id, "Vehicle registered");
        Ok(vehicle)
    }

    /// Retrieves a vehicle
    pub async fn get_vehicle(&self, id: VehicleId) -> Result<Vehicle, FleetError> {
        self.fleet.get_vehicle(id).await.map_err(|e| {
            if e.is_not_found() {
                FleetError::VehicleNotFound(id.to_string())
            } else {
                FleetError::Port(e)
            }
        })
    }

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, FleetError> {
        Ok(self.fleet.list_vehicles().await?)
    }

    pub async fn list_maintenance(&self, query: MaintenanceQuery) -> Result<Vec<MaintenanceRecord>, FleetError> {
        Ok(self.fleet.list_maintenance(query).await?)
    }

    /// Records a workshop visit
    ///
    /// An open visit (entered, not yet exited) moves an available vehicle to
    /// `Maintenance`. A rented vehicle keeps its status until it is returned.
    #[instrument(skip(self, record), fields(vehicle_id = %record.vehicle_id))]
    pub async fn record_maintenance(&self, record: MaintenanceRecord) -> Result<MaintenanceRecord, FleetError> {
        let mut vehicle = self.get_vehicle(record.vehicle_id).await?;

        self.fleet.save_maintenance(&record).await?;

        if record.is_open() && vehicle.status == VehicleStatus::Available {
            vehicle.set_status(VehicleStatus::Maintenance, self.clock.now());
            self.fleet.update_vehicle(&vehicle).await?;
        }
        if let Some(km) = record.mileage_at_service {
            if vehicle.record_mileage(km, self.clock.now()) {
                self.fleet.update_vehicle(&vehicle).await?;
            }
        }

        info!(
            record_id = %record.id,
            cost = %record.cost,
            kind = record.maintenance_type.as_str(),
            "Maintenance recorded"
        );
        Ok(record)
    }

    /// Closes a garage visit and releases the vehicle when nothing else holds it
    #[instrument(skip(self))]
    pub async fn close_maintenance(
        &self,
        record_id: MaintenanceRecordId,
        exit_date: NaiveDate,
    ) -> Result<MaintenanceRecord, FleetError> {
        let record = self.fleet.get_maintenance(record_id).await?;
        let entry = record.garage_entry_date.unwrap_or(record.performed_at);
        let record = record.with_garage_stay(entry, Some(exit_date))?;
        self.fleet.save_maintenance(&record).await?;

        let still_open = self
            .fleet
            .list_maintenance(MaintenanceQuery::for_vehicle(record.vehicle_id))
            .await?
            .iter()
            .any(MaintenanceRecord::is_open);

        let mut vehicle = self.get_vehicle(record.vehicle_id).await?;
        if vehicle.status == VehicleStatus::Maintenance && !still_open {
            vehicle.set_status(VehicleStatus::Available, self.clock.now());
            self.fleet.update_vehicle(&vehicle).await?;
            info!(vehicle_id = %vehicle.id, "Vehicle released from maintenance");
        }

        Ok(record)
    }

    /// Returns vehicles approaching or past their scheduled service
    pub async fn maintenance_alerts(&self) -> Result<Vec<MaintenanceAlert>, FleetError> {
        let today = self.clock.now().date_naive();
        let vehicles = self.fleet.list_vehicles().await?;
        let alerts = maintenance_alerts(&vehicles, today, self.thresholds);
        if !alerts.is_empty() {
            warn!(count = alerts.len(), "Vehicles due for maintenance");
        }
        Ok(alerts)
    }

    /// Vehicles whose insurance expires within `threshold_days`
    pub async fn expiring_insurance(&self, threshold_days: i64) -> Result<Vec<InsuranceAlert>, FleetError> {
        if threshold_days < 0 {
            return Err(FleetError::validation("days threshold must not be negative"));
        }
        let today = self.clock.now().date_naive();
        let vehicles = self.fleet.list_vehicles().await?;
        let alerts = expiring_insurance(&vehicles, today, threshold_days);
        if !alerts.is_empty() {
            warn!(count = alerts.len(), threshold_days, "Insurance policies expiring");
        }
        Ok(alerts)
    }

    /// Vehicles whose insurance has lapsed
    pub async fn expired_insurance(&self) -> Result<Vec<InsuranceAlert>, FleetError> {
        let today = self.clock.now().date_naive();
        let vehicles = self.fleet.list_vehicles().await?;
        let alerts = expired_insurance(&vehicles, today);
        if !alerts.is_empty() {
            warn!(count = alerts.len(), "Insurance policies expired");
        }
        Ok(alerts)
    }

    /// Starts a new one-year insurance term for a vehicle
    #[instrument(skip(self, renewal), fields(start = %renewal.start_date))]
    pub async fn renew_insurance(&self, id: VehicleId, renewal: InsuranceRenewal) -> Result<Vehicle, FleetError> {
        let mut vehicle = self.get_vehicle(id).await?;
        vehicle.renew_insurance(renewal, self.clock.now())?;
        self.fleet.update_vehicle(&vehicle).await?;
        info!(
            vehicle_id = %vehicle.id,
            premium = %vehicle.insurance_cost,
            expiry = ?vehicle.insurance.as_ref().map(|p| p.expiry_date),
            "Insurance renewed"
        );
        Ok(vehicle)
    }
}
