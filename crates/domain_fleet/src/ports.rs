//! Fleet Domain Ports
//!
//! Persistence interface for vehicles and maintenance records. The PostgreSQL
//! adapter lives in `infra_db`; an in-memory adapter for tests lives in
//! `test_utils`.

use async_trait::async_trait;

use core_kernel::{DateRange, DomainPort, MaintenanceRecordId, PortError, VehicleId};

use crate::maintenance::MaintenanceRecord;
use crate::vehicle::Vehicle;

/// Query parameters for maintenance records
#[derive(Debug, Clone, Copy, Default)]
pub struct MaintenanceQuery {
    /// Restrict to one vehicle
    pub vehicle_id: Option<VehicleId>,
    /// Restrict to records whose `performed_at` falls in the window
    pub performed_within: Option<DateRange>,
}

impl MaintenanceQuery {
    pub fn for_vehicle(vehicle_id: VehicleId) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            ..Default::default()
        }
    }

    pub fn within(mut self, window: DateRange) -> Self {
        self.performed_within = Some(window);
        self
    }

    /// Returns true if `record` satisfies the query
    pub fn matches(&self, record: &MaintenanceRecord) -> bool {
        self.vehicle_id.map_or(true, |id| record.vehicle_id == id)
            && self
                .performed_within
                .map_or(true, |w| w.contains(record.performed_at))
    }
}

/// Storage operations the fleet domain needs
#[async_trait]
pub trait FleetPort: DomainPort {
    /// Retrieves a vehicle, or `PortError::NotFound`
    async fn get_vehicle(&self, id: VehicleId) -> Result<Vehicle, PortError>;

    /// Lists every vehicle in the fleet ordered by plate number
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, PortError>;

    /// Inserts a new vehicle; a duplicate plate number is a `Conflict`
    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), PortError>;

    /// Overwrites a vehicle's mutable fields
    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), PortError>;

    /// Inserts or replaces a maintenance record
    async fn save_maintenance(&self, record: &MaintenanceRecord) -> Result<(), PortError>;

    /// Retrieves a maintenance record, or `PortError::NotFound`
    async fn get_maintenance(&self, id: MaintenanceRecordId) -> Result<MaintenanceRecord, PortError>;

    /// Lists maintenance records matching the query, oldest first
    async fn list_maintenance(&self, query: MaintenanceQuery) -> Result<Vec<MaintenanceRecord>, PortError>;
}
