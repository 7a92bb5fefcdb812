//! PostgreSQL Contract Adapter
//!
//! Implements [`ContractPort`] on top of [`ContractRepository`]. The client
//! snapshot is stored as JSONB; damage marks keep their diagram order through
//! a `position` column.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use core_kernel::{
    AmendmentId, ContractId, DamageMarkId, DomainPort, HealthCheckResult, HealthCheckable, PortError, VehicleId,
};
use domain_rental::{
    format_contract_number, AmendmentType, ContractAmendment, ContractChange, ContractDraft, ContractPort,
    ContractQuery, ContractRecord, ContractStatus, DamageMark, FuelLevel, RentalContract, VehicleStatusChange,
};

use crate::adapters::{currency, money, parse_column, ping};
use crate::error::DatabaseError;
use crate::repositories::contracts::{
    AmendmentRow, ContractRepository, ContractRow, ContractWithMarks, DamageMarkRow, VehicleUpdateRow,
};

/// PostgreSQL-backed implementation of [`ContractPort`]
#[derive(Debug, Clone)]
pub struct PostgresContractAdapter {
    repository: ContractRepository,
    pool: PgPool,
}

impl PostgresContractAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ContractRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &ContractRepository {
        &self.repository
    }
}

impl DomainPort for PostgresContractAdapter {}

#[async_trait]
impl HealthCheckable for PostgresContractAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-contract-adapter").await
    }
}

#[async_trait]
impl ContractPort for PostgresContractAdapter {
    #[instrument(skip(self, draft), fields(vehicle_id = %draft.vehicle_id))]
    async fn create_contract(&self, draft: ContractDraft) -> Result<RentalContract, PortError> {
        let contract = self
            .repository
            .insert_contract(move |sequence| {
                let contract = RentalContract::from_draft(format_contract_number(sequence), draft);
                Ok((contract_to_rows(&contract)?, contract))
            })
            .await?;

        info!(contract_number = %contract.contract_number(), "Contract stored");
        Ok(contract)
    }

    #[instrument(skip(self), fields(contract_id = %id))]
    async fn get_contract(&self, id: ContractId) -> Result<RentalContract, PortError> {
        let stored = self.repository.get(id.into()).await?;
        Ok(rows_to_contract(stored)?)
    }

    async fn get_by_number(&self, contract_number: &str) -> Result<RentalContract, PortError> {
        let stored = self.repository.get_by_number(contract_number).await?;
        Ok(rows_to_contract(stored)?)
    }

    #[instrument(skip(self))]
    async fn list_contracts(&self, query: ContractQuery) -> Result<Vec<RentalContract>, PortError> {
        let stored = self
            .repository
            .list(query.vehicle_id.map(Into::into), query.open_only)
            .await?;
        debug!(count = stored.len(), "Loaded contracts");
        stored
            .into_iter()
            .map(|s| rows_to_contract(s).map_err(PortError::from))
            .collect()
    }

    #[instrument(
        skip(self, change),
        fields(contract_id = %change.contract.id(), expected_version = change.expected_version)
    )]
    async fn commit(&self, change: ContractChange) -> Result<(), PortError> {
        let rows = contract_to_rows(&change.contract)?;
        let vehicle_updates: Vec<VehicleUpdateRow> = change.vehicle_updates.iter().map(vehicle_update_row).collect();
        let amendment = change.amendment.as_ref().map(amendment_to_row);

        self.repository
            .commit(&rows.contract, change.expected_version, &vehicle_updates, amendment.as_ref())
            .await?;
        Ok(())
    }

    async fn list_amendments(&self, contract_id: ContractId) -> Result<Vec<ContractAmendment>, PortError> {
        let rows = self.repository.list_amendments(contract_id.into()).await?;
        rows.into_iter()
            .map(|row| row_to_amendment(row).map_err(PortError::from))
            .collect()
    }
}

fn to_i32(column: &str, value: u32) -> Result<i32, DatabaseError> {
    i32::try_from(value).map_err(|_| DatabaseError::corrupt(column, value))
}

fn contract_to_rows(contract: &RentalContract) -> Result<ContractWithMarks, DatabaseError> {
    let record = contract.to_record();
    let client = serde_json::to_value(&record.client)
        .map_err(|e| DatabaseError::CorruptRow(format!("client snapshot: {}", e)))?;

    let marks = record
        .damage_marks
        .iter()
        .enumerate()
        .map(|(position, mark)| {
            Ok(DamageMarkRow {
                id: mark.id().into(),
                contract_id: record.id.into(),
                x: mark.x(),
                y: mark.y(),
                description: mark.description().to_string(),
                position: i32::try_from(position).map_err(|_| DatabaseError::corrupt("mark position", position))?,
            })
        })
        .collect::<Result<Vec<_>, DatabaseError>>()?;

    let row = ContractRow {
        id: record.id.into(),
        contract_number: record.contract_number,
        vehicle_id: record.vehicle_id.into(),
        client,
        rental_start: record.rental_start,
        rental_end: record.rental_end,
        rental_days: to_i32("rental days", record.rental_days)?,
        currency: record.daily_rate.currency().code().to_string(),
        daily_rate: record.daily_rate.amount(),
        total_amount: record.total_amount.amount(),
        discount: record.discount.amount(),
        final_amount: record.final_amount.amount(),
        status: record.status.map(|s| s.as_str().to_string()),
        pickup_km: record.pickup_km,
        return_km: record.return_km,
        fuel_level: record.fuel_level.map(|f| f.as_str().to_string()),
        return_fuel_level: record.return_fuel_level.map(|f| f.as_str().to_string()),
        km_limit: record.km_limit,
        over_limit_km_rate: record.over_limit_km_rate.map(|m| m.amount()),
        over_limit_km_fee: record.over_limit_km_fee.amount(),
        late_fee: record.late_fee.amount(),
        returned_at: record.returned_at,
        damage_inspection: record.damage_inspection,
        return_notes: record.return_notes,
        version: record.version,
        created_at: record.created_at,
        updated_at: record.updated_at,
    };

    Ok(ContractWithMarks { contract: row, marks })
}

fn rows_to_contract(stored: ContractWithMarks) -> Result<RentalContract, DatabaseError> {
    let ContractWithMarks { contract: row, marks } = stored;
    let ccy = currency(&row.currency)?;

    let client = serde_json::from_value(row.client)
        .map_err(|e| DatabaseError::CorruptRow(format!("client snapshot: {}", e)))?;
    let status = row
        .status
        .as_deref()
        .map(|s| parse_column("contract status", s, ContractStatus::parse))
        .transpose()?;
    let fuel_level = row
        .fuel_level
        .as_deref()
        .map(|f| parse_column("fuel level", f, FuelLevel::parse))
        .transpose()?;
    let return_fuel_level = row
        .return_fuel_level
        .as_deref()
        .map(|f| parse_column("fuel level", f, FuelLevel::parse))
        .transpose()?;
    let rental_days = u32::try_from(row.rental_days).map_err(|_| DatabaseError::corrupt("rental days", row.rental_days))?;

    let damage_marks = marks
        .into_iter()
        .map(|m| DamageMark::restore(DamageMarkId::from_uuid(m.id), m.x, m.y, m.description))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DatabaseError::CorruptRow(format!("damage mark: {}", e)))?;

    let record = ContractRecord {
        id: ContractId::from_uuid(row.id),
        contract_number: row.contract_number,
        vehicle_id: VehicleId::from_uuid(row.vehicle_id),
        client,
        rental_start: row.rental_start,
        rental_end: row.rental_end,
        rental_days,
        daily_rate: money(row.daily_rate, ccy),
        total_amount: money(row.total_amount, ccy),
        discount: money(row.discount, ccy),
        final_amount: money(row.final_amount, ccy),
        status,
        pickup_km: row.pickup_km,
        return_km: row.return_km,
        fuel_level,
        return_fuel_level,
        km_limit: row.km_limit,
        over_limit_km_rate: row.over_limit_km_rate.map(|a| money(a, ccy)),
        over_limit_km_fee: money(row.over_limit_km_fee, ccy),
        late_fee: money(row.late_fee, ccy),
        returned_at: row.returned_at,
        damage_inspection: row.damage_inspection,
        return_notes: row.return_notes,
        damage_marks,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };

    RentalContract::from_record(record).map_err(|e| DatabaseError::CorruptRow(e.to_string()))
}

fn vehicle_update_row(update: &VehicleStatusChange) -> VehicleUpdateRow {
    VehicleUpdateRow {
        vehicle_id: update.vehicle_id.into(),
        status: update.status.as_str().to_string(),
        mileage: update.mileage,
    }
}

fn amendment_to_row(amendment: &ContractAmendment) -> AmendmentRow {
    AmendmentRow {
        id: amendment.id.into(),
        contract_id: amendment.contract_id.into(),
        amendment_type: amendment.amendment_type.as_str().to_string(),
        reason: amendment.reason.clone(),
        previous_values: amendment.previous_values.clone(),
        new_values: amendment.new_values.clone(),
        amount_difference: amendment.amount_difference,
        created_at: amendment.created_at,
    }
}

fn row_to_amendment(row: AmendmentRow) -> Result<ContractAmendment, DatabaseError> {
    Ok(ContractAmendment {
        id: AmendmentId::from_uuid(row.id),
        contract_id: ContractId::from_uuid(row.contract_id),
        amendment_type: parse_column("amendment type", &row.amendment_type, AmendmentType::parse)?,
        reason: row.reason,
        previous_values: row.previous_values,
        new_values: row.new_values,
        amount_difference: row.amount_difference,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_kernel::{Money, RentalPeriod};
    use domain_rental::{price_rental, ClientDetails, StatusMarker};
    use rust_decimal_macros::dec;

    fn contract() -> RentalContract {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap();
        let draft = ContractDraft {
            vehicle_id: VehicleId::new(),
            client: ClientDetails::new("Nadine", "Khoury"),
            period: RentalPeriod::new(start, end).unwrap(),
            pricing: price_rental(Money::usd(dec!(60)), 3, Money::usd(dec!(10))).unwrap(),
            pickup_km: Some(41_000),
            fuel_level: Some(FuelLevel::ThreeQuarters),
            km_limit: Some(600),
            damage_marks: vec![
                DamageMark::new(dec!(12.5), dec!(40), "door dent").unwrap(),
                DamageMark::new(dec!(80), dec!(75), "bumper scratch").unwrap(),
            ],
            damage_inspection: Some("two marks".to_string()),
            opened_at: start,
        };
        RentalContract::from_draft("CTR-014", draft)
    }

    #[test]
    fn test_contract_rows_round_trip() {
        let original = contract();
        let rows = contract_to_rows(&original).unwrap();

        assert_eq!(rows.contract.status, None);
        assert_eq!(rows.contract.fuel_level.as_deref(), Some("3/4"));
        assert_eq!(rows.marks[1].position, 1);
        assert_eq!(rows.contract.client["first_name"], "Nadine");

        let restored = rows_to_contract(rows).unwrap();
        assert_eq!(restored.to_record(), original.to_record());
        assert_eq!(restored.status_marker(), StatusMarker::Derive);
    }

    #[test]
    fn test_unknown_fuel_level_is_corrupt_row() {
        let mut rows = contract_to_rows(&contract()).unwrap();
        rows.contract.fuel_level = Some("5/4".to_string());

        assert!(matches!(rows_to_contract(rows), Err(DatabaseError::CorruptRow(_))));
    }

    #[test]
    fn test_amendment_row_round_trip() {
        let amendment = ContractAmendment {
            id: AmendmentId::new(),
            contract_id: ContractId::new(),
            amendment_type: AmendmentType::VehicleChange,
            reason: "breakdown".to_string(),
            previous_values: serde_json::json!({ "vehicle_id": "a" }),
            new_values: serde_json::json!({ "vehicle_id": "b" }),
            amount_difference: dec!(0),
            created_at: Utc::now(),
        };

        let row = amendment_to_row(&amendment);
        assert_eq!(row.amendment_type, "vehicle_change");
        assert_eq!(row_to_amendment(row).unwrap(), amendment);
    }
}
