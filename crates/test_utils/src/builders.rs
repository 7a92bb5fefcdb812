//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use core_kernel::{Money, RentalPeriod, VehicleId};
use domain_fleet::{InsurancePolicy, MaintenanceRecord, MaintenanceType, Vehicle, VehicleStatus};
use domain_rental::{
    price_rental, ClientDetails, ContractDraft, DamageMark, FuelLevel, NewContract,
};
use rust_decimal_macros::dec;

use crate::fixtures::{ClientFixtures, MoneyFixtures, TemporalFixtures};

/// Builder for vehicles
pub struct VehicleBuilder {
    plate_number: String,
    brand: String,
    model: String,
    year: i32,
    daily_rate: Money,
    weekly_rate: Option<Money>,
    monthly_rate: Option<Money>,
    mileage: i64,
    status: VehicleStatus,
    insurance_cost: Money,
    insurance_expiry: Option<NaiveDate>,
    purchase_cost: Option<Money>,
    next_maintenance: (Option<NaiveDate>, Option<i64>),
}

impl Default for VehicleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleBuilder {
    /// A 50 USD/day Toyota Corolla with 10,000 km on the clock
    pub fn new() -> Self {
        Self {
            plate_number: format!("T-{}", &uuid::Uuid::new_v4().simple().to_string()[..6]),
            brand: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2023,
            daily_rate: MoneyFixtures::daily_rate(),
            weekly_rate: None,
            monthly_rate: None,
            mileage: 10_000,
            status: VehicleStatus::Available,
            insurance_cost: MoneyFixtures::annual_insurance(),
            insurance_expiry: None,
            purchase_cost: None,
            next_maintenance: (None, None),
        }
    }

    pub fn plate(mut self, plate: impl Into<String>) -> Self {
        self.plate_number = plate.into();
        self
    }

    pub fn make(mut self, brand: impl Into<String>, model: impl Into<String>) -> Self {
        self.brand = brand.into();
        self.model = model.into();
        self
    }

    pub fn daily_rate(mut self, rate: Money) -> Self {
        self.daily_rate = rate;
        self
    }

    pub fn weekly_rate(mut self, rate: Money) -> Self {
        self.weekly_rate = Some(rate);
        self
    }

    pub fn monthly_rate(mut self, rate: Money) -> Self {
        self.monthly_rate = Some(rate);
        self
    }

    pub fn mileage(mut self, km: i64) -> Self {
        self.mileage = km;
        self
    }

    pub fn status(mut self, status: VehicleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn insurance_cost(mut self, annual: Money) -> Self {
        self.insurance_cost = annual;
        self
    }

    /// Insured with a policy on record that expires on `date`
    pub fn insured_until(mut self, date: NaiveDate) -> Self {
        self.insurance_expiry = Some(date);
        self
    }

    pub fn purchase_cost(mut self, cost: Money) -> Self {
        self.purchase_cost = Some(cost);
        self
    }

    pub fn next_maintenance(mut self, date: Option<NaiveDate>, km: Option<i64>) -> Self {
        self.next_maintenance = (date, km);
        self
    }

    /// Builds the vehicle
    ///
    /// # Panics
    ///
    /// Panics if the configured values fail vehicle validation
    pub fn build(self) -> Vehicle {
        let mut vehicle = Vehicle::new(self.plate_number, self.brand, self.model, self.year, self.daily_rate)
            .expect("builder values are valid")
            .with_mileage(self.mileage)
            .with_insurance_cost(self.insurance_cost)
            .with_next_maintenance(self.next_maintenance.0, self.next_maintenance.1);
        if let Some(rate) = self.weekly_rate {
            vehicle = vehicle.with_weekly_rate(rate);
        }
        if let Some(rate) = self.monthly_rate {
            vehicle = vehicle.with_monthly_rate(rate);
        }
        if let Some(cost) = self.purchase_cost {
            vehicle = vehicle.with_purchase_cost(cost);
        }
        if let Some(expiry_date) = self.insurance_expiry {
            let policy_number = Some(format!("POL-{}", vehicle.plate_number));
            vehicle = vehicle.with_insurance(InsurancePolicy {
                provider: Some("Bankers Assurance".to_string()),
                policy_number,
                start_date: None,
                expiry_date,
            });
        }
        vehicle.status = self.status;
        vehicle
    }
}

/// Builder for [`NewContract`] requests sent to `RentalService::create_contract`
pub struct NewContractBuilder {
    request: NewContract,
}

impl NewContractBuilder {
    /// Seven days from the fixture start, priced from the vehicle's rate card
    pub fn new(vehicle_id: VehicleId) -> Self {
        let start = TemporalFixtures::rental_start();
        Self {
            request: NewContract {
                vehicle_id,
                client: ClientFixtures::client(),
                rental_start: start,
                rental_end: start + Duration::days(7),
                rental_days: 7,
                daily_rate: None,
                discount: None,
                pickup_km: Some(10_000),
                fuel_level: Some(FuelLevel::Full),
                km_limit: None,
                damage_marks: Vec::new(),
                damage_inspection: None,
            },
        }
    }

    /// Sets start and end, and declares the matching day count
    pub fn period(mut self, start: DateTime<Utc>, days: u32) -> Self {
        self.request.rental_start = start;
        self.request.rental_end = start + Duration::days(i64::from(days));
        self.request.rental_days = days;
        self
    }

    /// Overrides the declared day count only
    pub fn declared_days(mut self, days: u32) -> Self {
        self.request.rental_days = days;
        self
    }

    pub fn client(mut self, client: ClientDetails) -> Self {
        self.request.client = client;
        self
    }

    pub fn daily_rate(mut self, rate: Money) -> Self {
        self.request.daily_rate = Some(rate);
        self
    }

    pub fn discount(mut self, discount: Money) -> Self {
        self.request.discount = Some(discount);
        self
    }

    pub fn pickup_km(mut self, km: Option<i64>) -> Self {
        self.request.pickup_km = km;
        self
    }

    pub fn fuel_level(mut self, level: Option<FuelLevel>) -> Self {
        self.request.fuel_level = level;
        self
    }

    pub fn km_limit(mut self, limit: i64) -> Self {
        self.request.km_limit = Some(limit);
        self
    }

    pub fn damage_mark(mut self, mark: DamageMark) -> Self {
        self.request.damage_marks.push(mark);
        self
    }

    pub fn build(self) -> NewContract {
        self.request
    }
}

/// Builder for [`ContractDraft`]s handed straight to a `ContractPort`
pub struct ContractDraftBuilder {
    vehicle_id: VehicleId,
    client: ClientDetails,
    start: DateTime<Utc>,
    days: u32,
    daily_rate: Money,
    discount: Money,
    pickup_km: Option<i64>,
    fuel_level: Option<FuelLevel>,
    km_limit: Option<i64>,
    damage_marks: Vec<DamageMark>,
}

impl ContractDraftBuilder {
    pub fn new(vehicle_id: VehicleId) -> Self {
        Self {
            vehicle_id,
            client: ClientFixtures::client(),
            start: TemporalFixtures::rental_start(),
            days: 7,
            daily_rate: MoneyFixtures::daily_rate(),
            discount: MoneyFixtures::usd_zero(),
            pickup_km: Some(10_000),
            fuel_level: Some(FuelLevel::Full),
            km_limit: None,
            damage_marks: Vec::new(),
        }
    }

    pub fn period(mut self, start: DateTime<Utc>, days: u32) -> Self {
        self.start = start;
        self.days = days;
        self
    }

    pub fn daily_rate(mut self, rate: Money) -> Self {
        self.daily_rate = rate;
        self
    }

    pub fn discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    pub fn km_limit(mut self, limit: i64) -> Self {
        self.km_limit = Some(limit);
        self
    }

    pub fn damage_mark(mut self, x: i64, y: i64, description: &str) -> Self {
        let mark = DamageMark::new(x.into(), y.into(), description).expect("fixture mark is valid");
        self.damage_marks.push(mark);
        self
    }

    /// # Panics
    ///
    /// Panics if the period or pricing is invalid
    pub fn build(self) -> ContractDraft {
        let period = RentalPeriod::new(self.start, self.start + Duration::days(i64::from(self.days)))
            .expect("builder period is valid");
        let pricing = price_rental(self.daily_rate, self.days, self.discount).expect("builder pricing is valid");
        ContractDraft {
            vehicle_id: self.vehicle_id,
            client: self.client,
            period,
            pricing,
            pickup_km: self.pickup_km,
            fuel_level: self.fuel_level,
            km_limit: self.km_limit,
            damage_marks: self.damage_marks,
            damage_inspection: None,
            opened_at: self.start - Duration::hours(1),
        }
    }
}

/// Builder for maintenance records
pub struct MaintenanceBuilder {
    vehicle_id: VehicleId,
    maintenance_type: MaintenanceType,
    description: String,
    cost: Money,
    performed_at: NaiveDate,
    garage: Option<(NaiveDate, Option<NaiveDate>)>,
    mileage: Option<i64>,
}

impl MaintenanceBuilder {
    pub fn new(vehicle_id: VehicleId) -> Self {
        Self {
            vehicle_id,
            maintenance_type: MaintenanceType::OilChange,
            description: "Scheduled service".to_string(),
            cost: Money::usd(dec!(80)),
            performed_at: TemporalFixtures::rental_start().date_naive(),
            garage: None,
            mileage: None,
        }
    }

    pub fn kind(mut self, maintenance_type: MaintenanceType) -> Self {
        self.maintenance_type = maintenance_type;
        self
    }

    pub fn cost(mut self, cost: Money) -> Self {
        self.cost = cost;
        self
    }

    pub fn performed_at(mut self, date: NaiveDate) -> Self {
        self.performed_at = date;
        self
    }

    pub fn garage_stay(mut self, entry: NaiveDate, exit: Option<NaiveDate>) -> Self {
        self.garage = Some((entry, exit));
        self
    }

    pub fn mileage(mut self, km: i64) -> Self {
        self.mileage = Some(km);
        self
    }

    /// # Panics
    ///
    /// Panics if the record fails validation
    pub fn build(self) -> MaintenanceRecord {
        let mut record = MaintenanceRecord::new(
            self.vehicle_id,
            self.maintenance_type,
            self.description,
            self.cost,
            self.performed_at,
        )
        .expect("builder values are valid");
        if let Some((entry, exit)) = self.garage {
            record = record.with_garage_stay(entry, exit).expect("builder garage stay is valid");
        }
        if let Some(km) = self.mileage {
            record = record.with_mileage(km);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_builder_defaults() {
        let vehicle = VehicleBuilder::new().build();
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert_eq!(vehicle.daily_rate, MoneyFixtures::daily_rate());
        assert_eq!(vehicle.mileage, 10_000);
    }

    #[test]
    fn test_draft_builder_prices_the_period() {
        let draft = ContractDraftBuilder::new(VehicleId::new())
            .daily_rate(Money::usd(dec!(40)))
            .period(TemporalFixtures::rental_start(), 3)
            .build();
        assert_eq!(draft.pricing.final_amount, Money::usd(dec!(120)));
        assert_eq!(draft.period.calendar_days(), 3);
    }
}
