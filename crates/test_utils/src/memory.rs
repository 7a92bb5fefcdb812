//! In-Memory Port Adapters
//!
//! A single [`InMemoryStore`] implements `FleetPort`, `ContractPort` and
//! `InvoicePort` with the same guarantees the PostgreSQL adapters give:
//! sequential contract and invoice numbers, a version compare-and-swap on
//! contract commits, vehicle updates applied with the contract write, one
//! invoice per contract and mileage that never moves backwards.
//!
//! Tests can inject write conflicts with
//! [`fail_next_commits`](InMemoryStore::fail_next_commits) to exercise the
//! service retry loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use core_kernel::{
    AdapterHealth, ContractId, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, MaintenanceRecordId,
    PortError, VehicleId,
};
use domain_billing::{format_invoice_number, Invoice, InvoiceDraft, InvoicePort, InvoiceQuery};
use domain_fleet::{FleetPort, MaintenanceQuery, MaintenanceRecord, Vehicle, VehicleStatus};
use domain_rental::{
    format_contract_number, ContractAmendment, ContractChange, ContractDraft, ContractPort, ContractQuery,
    RentalContract,
};

#[derive(Default)]
struct State {
    vehicles: HashMap<VehicleId, Vehicle>,
    maintenance: HashMap<MaintenanceRecordId, MaintenanceRecord>,
    contracts: HashMap<ContractId, RentalContract>,
    amendments: Vec<ContractAmendment>,
    invoices: HashMap<InvoiceId, Invoice>,
    contract_counter: i64,
    invoice_counter: i64,
}

/// Shared in-memory store for service and router tests
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    injected_conflicts: AtomicU32,
    commits: AtomicU32,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` contract commits fail with `PortError::Conflict`
    pub fn fail_next_commits(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    /// Number of contract commits attempted, including injected failures
    pub fn commit_attempts(&self) -> u32 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Inserts a contract directly, bypassing numbering and vehicle updates
    pub async fn seed_contract(&self, contract: RentalContract) {
        let mut state = self.state.lock().await;
        state.contracts.insert(contract.id(), contract);
    }

    /// Inserts an invoice directly
    pub async fn seed_invoice(&self, invoice: Invoice) {
        let mut state = self.state.lock().await;
        state.invoices.insert(invoice.id, invoice);
    }

    pub async fn contract_count(&self) -> usize {
        self.state.lock().await.contracts.len()
    }

    pub async fn invoice_count(&self) -> usize {
        self.state.lock().await.invoices.len()
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl DomainPort for InMemoryStore {}

#[async_trait]
impl HealthCheckable for InMemoryStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

fn apply_vehicle_mileage(vehicle: &mut Vehicle, mileage: Option<i64>) {
    if let Some(km) = mileage {
        vehicle.mileage = vehicle.mileage.max(km);
    }
}

#[async_trait]
impl FleetPort for InMemoryStore {
    async fn get_vehicle(&self, id: VehicleId) -> Result<Vehicle, PortError> {
        let state = self.state.lock().await;
        state
            .vehicles
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Vehicle", id))
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, PortError> {
        let state = self.state.lock().await;
        let mut vehicles: Vec<Vehicle> = state.vehicles.values().cloned().collect();
        vehicles.sort_by(|a, b| a.plate_number.cmp(&b.plate_number));
        Ok(vehicles)
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        if state.vehicles.values().any(|v| v.plate_number == vehicle.plate_number) {
            return Err(PortError::conflict(format!(
                "plate number {} is already registered",
                vehicle.plate_number
            )));
        }
        state.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        let stored = state
            .vehicles
            .get_mut(&vehicle.id)
            .ok_or_else(|| PortError::not_found("Vehicle", vehicle.id))?;
        let mileage = stored.mileage.max(vehicle.mileage);
        *stored = vehicle.clone();
        stored.mileage = mileage;
        Ok(())
    }

    async fn save_maintenance(&self, record: &MaintenanceRecord) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        if !state.vehicles.contains_key(&record.vehicle_id) {
            return Err(PortError::validation(format!(
                "maintenance record references unknown vehicle {}",
                record.vehicle_id
            )));
        }
        state.maintenance.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_maintenance(&self, id: MaintenanceRecordId) -> Result<MaintenanceRecord, PortError> {
        let state = self.state.lock().await;
        state
            .maintenance
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("MaintenanceRecord", id))
    }

    async fn list_maintenance(&self, query: MaintenanceQuery) -> Result<Vec<MaintenanceRecord>, PortError> {
        let state = self.state.lock().await;
        let mut records: Vec<MaintenanceRecord> = state
            .maintenance
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.performed_at, r.created_at));
        Ok(records)
    }
}

#[async_trait]
impl ContractPort for InMemoryStore {
    async fn create_contract(&self, draft: ContractDraft) -> Result<RentalContract, PortError> {
        let mut state = self.state.lock().await;
        let opened_at = draft.opened_at;
        let vehicle = state
            .vehicles
            .get_mut(&draft.vehicle_id)
            .ok_or_else(|| PortError::not_found("Vehicle", draft.vehicle_id))?;
        vehicle.set_status(VehicleStatus::Rented, opened_at);

        state.contract_counter += 1;
        let contract = RentalContract::from_draft(format_contract_number(state.contract_counter), draft);
        state.contracts.insert(contract.id(), contract.clone());
        Ok(contract)
    }

    async fn get_contract(&self, id: ContractId) -> Result<RentalContract, PortError> {
        let state = self.state.lock().await;
        state
            .contracts
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Contract", id))
    }

    async fn get_by_number(&self, contract_number: &str) -> Result<RentalContract, PortError> {
        let state = self.state.lock().await;
        state
            .contracts
            .values()
            .find(|c| c.contract_number() == contract_number)
            .cloned()
            .ok_or_else(|| PortError::not_found("Contract", contract_number))
    }

    async fn list_contracts(&self, query: ContractQuery) -> Result<Vec<RentalContract>, PortError> {
        let state = self.state.lock().await;
        let mut contracts: Vec<RentalContract> = state
            .contracts
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        contracts.sort_by(|a, b| {
            a.rental_start()
                .cmp(&b.rental_start())
                .then_with(|| a.contract_number().cmp(b.contract_number()))
        });
        Ok(contracts)
    }

    async fn commit(&self, change: ContractChange) -> Result<(), PortError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if self.take_injected_conflict() {
            return Err(PortError::conflict("injected write conflict"));
        }

        let mut state = self.state.lock().await;
        let id = change.contract.id();
        let stored_version = state
            .contracts
            .get(&id)
            .map(RentalContract::version)
            .ok_or_else(|| PortError::not_found("Contract", id))?;
        if stored_version != change.expected_version {
            return Err(PortError::conflict(format!(
                "contract {} is at version {}, expected {}",
                change.contract.contract_number(),
                stored_version,
                change.expected_version
            )));
        }

        let at = change.contract.updated_at();
        for update in &change.vehicle_updates {
            if !state.vehicles.contains_key(&update.vehicle_id) {
                return Err(PortError::not_found("Vehicle", update.vehicle_id));
            }
        }
        for update in &change.vehicle_updates {
            if let Some(vehicle) = state.vehicles.get_mut(&update.vehicle_id) {
                vehicle.set_status(update.status, at);
                apply_vehicle_mileage(vehicle, update.mileage);
            }
        }
        if let Some(amendment) = change.amendment {
            state.amendments.push(amendment);
        }
        state.contracts.insert(id, change.contract);
        Ok(())
    }

    async fn list_amendments(&self, contract_id: ContractId) -> Result<Vec<ContractAmendment>, PortError> {
        let state = self.state.lock().await;
        Ok(state
            .amendments
            .iter()
            .filter(|a| a.contract_id == contract_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InvoicePort for InMemoryStore {
    async fn create_if_absent(
        &self,
        draft: InvoiceDraft,
        created_at: DateTime<Utc>,
    ) -> Result<(Invoice, bool), PortError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.invoices.values().find(|i| i.contract_id == draft.contract_id) {
            return Ok((existing.clone(), false));
        }

        state.invoice_counter += 1;
        let invoice = Invoice::from_draft(format_invoice_number(state.invoice_counter), draft, created_at);
        state.invoices.insert(invoice.id, invoice.clone());
        Ok((invoice, true))
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        let state = self.state.lock().await;
        state
            .invoices
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Invoice", id))
    }

    async fn get_for_contract(&self, contract_id: ContractId) -> Result<Option<Invoice>, PortError> {
        let state = self.state.lock().await;
        Ok(state.invoices.values().find(|i| i.contract_id == contract_id).cloned())
    }

    async fn list_invoices(&self, query: InvoiceQuery) -> Result<Vec<Invoice>, PortError> {
        let state = self.state.lock().await;
        let mut invoices: Vec<Invoice> = state
            .invoices
            .values()
            .filter(|i| query.matches(i))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| {
            b.invoice_date
                .cmp(&a.invoice_date)
                .then_with(|| b.invoice_number.cmp(&a.invoice_number))
        });
        Ok(invoices)
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        let stored = state
            .invoices
            .get_mut(&invoice.id)
            .ok_or_else(|| PortError::not_found("Invoice", invoice.id))?;
        stored.payment_status = invoice.payment_status;
        stored.payment_method = invoice.payment_method;
        stored.paid_at = invoice.paid_at;
        stored.updated_at = invoice.updated_at;
        Ok(())
    }
}
