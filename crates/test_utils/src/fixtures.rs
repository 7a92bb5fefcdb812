//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the rental system, plus a
//! [`TestHarness`] that wires every service over one [`InMemoryStore`] and a
//! [`FixedClock`].

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{Clock, Currency, FixedClock, Money};
use domain_analytics::ProfitabilityService;
use domain_billing::{BillingConfig, InvoicePort, InvoiceService};
use domain_fleet::{FleetPort, FleetService};
use domain_rental::{ClientDetails, ContractPort, RentalConfig, RentalService};
use rust_decimal_macros::dec;

use crate::memory::InMemoryStore;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Standard daily rate
    pub fn daily_rate() -> Money {
        Money::usd(dec!(50))
    }

    /// Annual insurance premium for a fleet car
    pub fn annual_insurance() -> Money {
        Money::usd(dec!(1200))
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// An amount in another currency for mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100), Currency::EUR)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard rental start (June 1, 2026 09:00 UTC)
    pub fn rental_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    /// Instant the harness clock starts at, one hour before the rental start
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
    }

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }
}

/// Fixture for client data
pub struct ClientFixtures;

impl ClientFixtures {
    pub fn client() -> ClientDetails {
        let mut client = ClientDetails::new("Rami", "Khoury");
        client.phone = Some("+961 70 123 456".to_string());
        client.driving_license_number = Some("DL-448812".to_string());
        client
    }

    pub fn named(first: &str, last: &str) -> ClientDetails {
        ClientDetails::new(first, last)
    }
}

/// Every service wired over one in-memory store and a pinned clock
pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub fleet: FleetService,
    pub rental: RentalService,
    pub invoices: InvoiceService,
    pub analytics: ProfitabilityService,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Harness at [`TemporalFixtures::now`] with default configuration
    pub fn new() -> Self {
        Self::with_config(RentalConfig::default(), BillingConfig::default())
    }

    pub fn with_config(rental: RentalConfig, billing: BillingConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(TemporalFixtures::now()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let fleet_port: Arc<dyn FleetPort> = store.clone();
        let contract_port: Arc<dyn ContractPort> = store.clone();
        let invoice_port: Arc<dyn InvoicePort> = store.clone();

        Self {
            fleet: FleetService::new(fleet_port.clone(), dyn_clock.clone()),
            rental: RentalService::new(contract_port.clone(), fleet_port.clone(), dyn_clock.clone())
                .with_config(rental),
            invoices: InvoiceService::new(invoice_port.clone(), contract_port.clone(), dyn_clock.clone())
                .with_config(billing),
            analytics: ProfitabilityService::new(fleet_port, contract_port, invoice_port, dyn_clock),
            store,
            clock,
        }
    }

    /// Moves the harness clock
    pub fn set_now(&self, instant: DateTime<Utc>) {
        self.clock.set(instant);
    }
}
