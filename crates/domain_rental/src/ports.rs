//! Rental Domain Ports
//!
//! Contract persistence. Every write that changes a contract goes through
//! [`ContractPort::commit`], which applies the contract, any vehicle updates
//! and an optional amendment in one transaction, guarded by a compare-and-swap
//! on the contract version.

use async_trait::async_trait;

use core_kernel::{ContractId, DomainPort, PortError, VehicleId};
use domain_fleet::VehicleStatus;

use crate::amendment::ContractAmendment;
use crate::contract::{ContractDraft, RentalContract};

/// A vehicle write that rides along with a contract write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleStatusChange {
    pub vehicle_id: VehicleId,
    pub status: VehicleStatus,
    /// Odometer to advance to; stores never move mileage backwards
    pub mileage: Option<i64>,
}

impl VehicleStatusChange {
    pub fn to(vehicle_id: VehicleId, status: VehicleStatus) -> Self {
        Self {
            vehicle_id,
            status,
            mileage: None,
        }
    }

    pub fn with_mileage(mut self, km: i64) -> Self {
        self.mileage = Some(km);
        self
    }
}

/// A unit of work on an existing contract
#[derive(Debug, Clone)]
pub struct ContractChange {
    /// Contract state to persist, carrying the already incremented version
    pub contract: RentalContract,
    /// Version the contract had when it was read
    pub expected_version: i64,
    pub vehicle_updates: Vec<VehicleStatusChange>,
    pub amendment: Option<ContractAmendment>,
}

impl ContractChange {
    pub fn new(contract: RentalContract, expected_version: i64) -> Self {
        Self {
            contract,
            expected_version,
            vehicle_updates: Vec::new(),
            amendment: None,
        }
    }

    pub fn with_vehicle_update(mut self, update: VehicleStatusChange) -> Self {
        self.vehicle_updates.push(update);
        self
    }

    pub fn with_amendment(mut self, amendment: ContractAmendment) -> Self {
        self.amendment = Some(amendment);
        self
    }
}

/// Filter for listing contracts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractQuery {
    pub vehicle_id: Option<VehicleId>,
    /// Skip contracts that are completed
    pub open_only: bool,
}

impl ContractQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_vehicle(vehicle_id: VehicleId) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            open_only: false,
        }
    }

    pub fn open_only(mut self) -> Self {
        self.open_only = true;
        self
    }

    /// Returns true if `contract` satisfies the query
    pub fn matches(&self, contract: &RentalContract) -> bool {
        self.vehicle_id.map_or(true, |id| contract.vehicle_id() == id)
            && (!self.open_only || !contract.is_completed())
    }
}

/// Storage operations the rental domain needs
#[async_trait]
pub trait ContractPort: DomainPort {
    /// Assigns the next contract number, inserts the contract with its damage
    /// marks and flips the vehicle to `Rented`, atomically
    ///
    /// A number collision under concurrent creation is a `Conflict`.
    async fn create_contract(&self, draft: ContractDraft) -> Result<RentalContract, PortError>;

    /// Retrieves a contract, or `PortError::NotFound`
    async fn get_contract(&self, id: ContractId) -> Result<RentalContract, PortError>;

    /// Retrieves a contract by its `CTR-` number
    async fn get_by_number(&self, contract_number: &str) -> Result<RentalContract, PortError>;

    /// Lists contracts matching the query, ordered by rental start
    async fn list_contracts(&self, query: ContractQuery) -> Result<Vec<RentalContract>, PortError>;

    /// Persists a change if the stored version still equals
    /// `expected_version`, else fails with `Conflict`
    async fn commit(&self, change: ContractChange) -> Result<(), PortError>;

    /// Lists amendments for a contract, oldest first
    async fn list_amendments(&self, contract_id: ContractId) -> Result<Vec<ContractAmendment>, PortError>;
}
