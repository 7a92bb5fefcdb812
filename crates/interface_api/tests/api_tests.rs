//! Router tests against the in-memory store

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use core_kernel::FixedClock;
use interface_api::{config::AppConfig, create_router, AppState};
use test_utils::{InMemoryStore, TemporalFixtures};

// ============================================================================
// Helpers
// ============================================================================

fn app() -> (Router, Arc<InMemoryStore>, Arc<FixedClock>) {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::new(TemporalFixtures::now()));
    let state = AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        clock.clone(),
        &AppConfig::default(),
    )
    .unwrap()
    .with_health_check(store.clone());
    (create_router(state), store, clock)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Amount of a serialized `Money`
fn amount(money: &Value) -> Decimal {
    match &money["amount"] {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

async fn create_vehicle(app: &Router, plate: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/fleet/vehicles",
        Some(json!({
            "plate_number": plate,
            "brand": "Toyota",
            "model": "Corolla",
            "year": 2023,
            "daily_rate": "50",
            "mileage": 10000,
            "insurance_cost": "1200"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

fn contract_body(vehicle_id: &str) -> Value {
    json!({
        "vehicle_id": vehicle_id,
        "client": { "first_name": "Rami", "last_name": "Khoury" },
        "rental_start": "2026-06-01T09:00:00Z",
        "rental_end": "2026-06-08T09:00:00Z",
        "rental_days": 7,
        "fuel_level": "Full"
    })
}

async fn open_contract(app: &Router, vehicle_id: &str) -> Value {
    let (status, body) = send(app, Method::POST, "/api/v1/contracts", Some(contract_body(vehicle_id))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

// ============================================================================
// Health
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness_and_readiness() {
        let (app, _, _) = app();

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, Method::GET, "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["adapters"][0]["adapter_id"], "in-memory-store");
    }
}

// ============================================================================
// Fleet
// ============================================================================

mod fleet_tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_fetch_vehicle() {
        let (app, _, _) = app();
        let id = create_vehicle(&app, "B-1001").await;

        let (status, body) = send(&app, Method::GET, &format!("/api/v1/fleet/vehicles/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plate_number"], "B-1001");
        assert_eq!(body["status"], "Available");
        assert_eq!(amount(&body["daily_rate"]), dec!(50));
    }

    #[tokio::test]
    async fn test_duplicate_plate_is_conflict() {
        let (app, _, _) = app();
        create_vehicle(&app, "B-1001").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/fleet/vehicles",
            Some(json!({
                "plate_number": "B-1001",
                "brand": "Kia",
                "model": "Rio",
                "year": 2022,
                "daily_rate": "40"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn test_blank_plate_fails_validation() {
        let (app, _, _) = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/fleet/vehicles",
            Some(json!({
                "plate_number": "",
                "brand": "Kia",
                "model": "Rio",
                "year": 2022,
                "daily_rate": "40"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["details"][0].as_str().unwrap().starts_with("plate_number"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (app, _, _) = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/fleet/vehicles",
            Some(json!({ "plate_number": "B-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_open_garage_visit_parks_vehicle_until_closed() {
        let (app, _, _) = app();
        let id = create_vehicle(&app, "B-2002").await;

        let (status, record) = send(
            &app,
            Method::POST,
            "/api/v1/fleet/maintenance",
            Some(json!({
                "vehicle_id": id,
                "maintenance_type": "Oil Change",
                "cost": "80",
                "performed_at": "2026-05-20",
                "garage_entry_date": "2026-05-20"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{record}");

        let (_, vehicle) = send(&app, Method::GET, &format!("/api/v1/fleet/vehicles/{id}"), None).await;
        assert_eq!(vehicle["status"], "Maintenance");

        let record_id = record["id"].as_str().unwrap();
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/fleet/maintenance/{record_id}/close"),
            Some(json!({ "exit_date": "2026-05-22" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, vehicle) = send(&app, Method::GET, &format!("/api/v1/fleet/vehicles/{id}"), None).await;
        assert_eq!(vehicle["status"], "Available");

        let (_, listed) = send(
            &app,
            Method::GET,
            &format!("/api/v1/fleet/maintenance?vehicle_id={id}&from=2026-05-01&to=2026-05-31"),
            None,
        )
        .await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rented_status_cannot_be_set_directly() {
        let (app, _, _) = app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/fleet/vehicles",
            Some(json!({
                "plate_number": "B-3003",
                "brand": "Kia",
                "model": "Rio",
                "year": 2022,
                "daily_rate": "40",
                "status": "Rented"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_insurance_expiry_lists_and_renewal() {
        let (app, _, _) = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/fleet/vehicles",
            Some(json!({
                "plate_number": "INS-100",
                "brand": "Nissan",
                "model": "Sunny",
                "year": 2022,
                "daily_rate": "40",
                "insurance_cost": "1100",
                "insurance_provider": "AXA",
                "insurance_expiry_date": "2026-06-15"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["id"].as_str().unwrap().to_string();

        let (status, lapsed) = send(
            &app,
            Method::POST,
            "/api/v1/fleet/vehicles",
            Some(json!({
                "plate_number": "INS-200",
                "brand": "Kia",
                "model": "Rio",
                "year": 2021,
                "daily_rate": "35",
                "insurance_start_date": "2025-05-20"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{lapsed}");
        assert_eq!(lapsed["insurance"]["expiry_date"], "2026-05-20");

        let (_, expiring) = send(&app, Method::GET, "/api/v1/fleet/insurance/expiring", None).await;
        assert_eq!(expiring.as_array().unwrap().len(), 1);
        assert_eq!(expiring[0]["plate_number"], "INS-100");
        assert_eq!(expiring[0]["days_until_expiry"], 14);
        assert_eq!(expiring[0]["status"], "expiring_soon");

        let (_, narrow) = send(&app, Method::GET, "/api/v1/fleet/insurance/expiring?days=10", None).await;
        assert!(narrow.as_array().unwrap().is_empty());

        let (_, expired) = send(&app, Method::GET, "/api/v1/fleet/insurance/expired", None).await;
        assert_eq!(expired.as_array().unwrap().len(), 1);
        assert_eq!(expired[0]["plate_number"], "INS-200");

        let (status, renewed) = send(
            &app,
            Method::POST,
            &format!("/api/v1/fleet/vehicles/{id}/insurance"),
            Some(json!({ "start_date": "2026-06-15", "annual_premium": "1300", "policy_number": "AXA-77" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{renewed}");
        assert_eq!(renewed["insurance"]["expiry_date"], "2027-06-15");
        assert_eq!(renewed["insurance"]["provider"], "AXA");
        assert_eq!(amount(&renewed["insurance_cost"]), dec!(1300));

        let (_, expiring) = send(&app, Method::GET, "/api/v1/fleet/insurance/expiring", None).await;
        assert!(expiring.as_array().unwrap().is_empty());

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/fleet/vehicles/{id}/insurance"),
            Some(json!({ "start_date": "2026-06-15", "annual_premium": "-10" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

// ============================================================================
// Contracts
// ============================================================================

mod contract_tests {
    use super::*;

    #[tokio::test]
    async fn test_open_contract_prices_and_rents_vehicle() {
        let (app, _, _) = app();
        let vehicle_id = create_vehicle(&app, "C-1").await;

        let body = open_contract(&app, &vehicle_id).await;
        let contract = &body["contract"];
        assert_eq!(contract["contract_number"], "CTR-001");
        assert_eq!(contract["status"], "active");
        assert_eq!(amount(&contract["final_amount"]), dec!(350));
        assert_eq!(body["rate_tier"], "daily");
        assert_eq!(body["conflicts"]["count"], 0);
        assert!(body.get("day_count_mismatch").is_none());

        let (_, vehicle) = send(&app, Method::GET, &format!("/api/v1/fleet/vehicles/{vehicle_id}"), None).await;
        assert_eq!(vehicle["status"], "Rented");
    }

    #[tokio::test]
    async fn test_overlap_is_reported_with_contract_numbers() {
        let (app, _, _) = app();
        let vehicle_id = create_vehicle(&app, "C-2").await;
        open_contract(&app, &vehicle_id).await;

        let second = open_contract(&app, &vehicle_id).await;
        assert_eq!(second["contract"]["contract_number"], "CTR-002");
        assert_eq!(second["conflicts"]["count"], 1);
        assert_eq!(second["conflicts"]["contract_numbers"][0], "CTR-001");

        let (status, report) = send(
            &app,
            Method::GET,
            &format!(
                "/api/v1/contracts/availability?vehicle_id={vehicle_id}&start=2026-06-08T09:00:00Z&end=2026-06-10T09:00:00Z"
            ),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["count"], 0);
    }

    #[tokio::test]
    async fn test_discount_uses_vehicle_currency() {
        let (app, _, _) = app();
        let vehicle_id = create_vehicle(&app, "C-3").await;

        let mut body = contract_body(&vehicle_id);
        body["discount"] = json!("20");
        let (status, body) = send(&app, Method::POST, "/api/v1/contracts", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(amount(&body["contract"]["final_amount"]), dec!(330));
        assert_eq!(body["contract"]["discount"]["currency"], "USD");
    }

    #[tokio::test]
    async fn test_lookup_by_number_and_missing_contract() {
        let (app, _, _) = app();
        let vehicle_id = create_vehicle(&app, "C-4").await;
        open_contract(&app, &vehicle_id).await;

        let (status, body) = send(&app, Method::GET, "/api/v1/contracts/by-number/CTR-001", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["vehicle_id"].as_str().unwrap(), vehicle_id);

        let missing = uuid::Uuid::new_v4();
        let (status, body) = send(&app, Method::GET, &format!("/api/v1/contracts/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_renew_and_amend_rate() {
        let (app, _, _) = app();
        let vehicle_id = create_vehicle(&app, "C-5").await;
        let opened = open_contract(&app, &vehicle_id).await;
        let id = opened["contract"]["id"].as_str().unwrap();

        let (status, renewal) = send(
            &app,
            Method::POST,
            &format!("/api/v1/contracts/{id}/renew"),
            Some(json!({ "additional_days": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{renewal}");
        assert_eq!(amount(&renewal["additional_cost"]), dec!(150));
        assert_eq!(amount(&renewal["contract"]["final_amount"]), dec!(500));
        assert_eq!(renewal["contract"]["rental_days"], 10);

        let (status, amended) = send(
            &app,
            Method::POST,
            &format!("/api/v1/contracts/{id}/amendments/rate"),
            Some(json!({ "daily_rate": "45", "reason": "Loyalty rate" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{amended}");
        assert_eq!(amount(&amended["contract"]["final_amount"]), dec!(450));

        let (_, history) = send(&app, Method::GET, &format!("/api/v1/contracts/{id}/amendments"), None).await;
        assert_eq!(history.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_amendment_requires_reason() {
        let (app, _, _) = app();
        let vehicle_id = create_vehicle(&app, "C-6").await;
        let opened = open_contract(&app, &vehicle_id).await;
        let id = opened["contract"]["id"].as_str().unwrap();

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/contracts/{id}/amendments/rate"),
            Some(json!({ "daily_rate": "45", "reason": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_status_follows_clock_and_override() {
        let (app, _, clock) = app();
        let vehicle_id = create_vehicle(&app, "C-7").await;
        let opened = open_contract(&app, &vehicle_id).await;
        let id = opened["contract"]["id"].as_str().unwrap();

        clock.set(TemporalFixtures::at(2026, 6, 9, 9));
        let (_, body) = send(&app, Method::GET, &format!("/api/v1/contracts/{id}"), None).await;
        assert_eq!(body["status"], "overdue");

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/contracts/{id}/status"),
            Some(json!({ "status": "active" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");

        let (_, body) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/contracts/{id}/status"),
            Some(json!({ "status": null })),
        )
        .await;
        assert_eq!(body["status"], "overdue");
    }
}

// ============================================================================
// Settlement and invoicing
// ============================================================================

mod settlement_tests {
    use super::*;

    async fn settled(app: &Router) -> String {
        let vehicle_id = create_vehicle(app, "S-1").await;
        let opened = open_contract(app, &vehicle_id).await;
        let id = opened["contract"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app,
            Method::POST,
            &format!("/api/v1/contracts/{id}/settle"),
            Some(json!({
                "return_km": 10300,
                "return_fuel_level": "Full",
                "returned_at": "2026-06-08T09:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["contract"]["status"], "completed");
        assert_eq!(amount(&body["amount_due"]), dec!(350));
        assert_eq!(body["settlement"]["days_late"], 0);
        assert_eq!(body["invoice"]["invoice_number"], "INV-00001");
        id
    }

    #[tokio::test]
    async fn test_settle_releases_vehicle_and_rejects_second_return() {
        let (app, _, _) = app();
        let id = settled(&app).await;

        let (_, vehicles) = send(&app, Method::GET, "/api/v1/fleet/vehicles", None).await;
        assert_eq!(vehicles[0]["status"], "Available");
        assert_eq!(vehicles[0]["mileage"], 10300);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/contracts/{id}/settle"),
            Some(json!({ "return_km": 10400 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_settlement_issues_the_invoice_once() {
        let (app, store, _) = app();
        let id = settled(&app).await;

        let (status, stored) = send(&app, Method::GET, &format!("/api/v1/contracts/{id}/invoice"), None).await;
        assert_eq!(status, StatusCode::OK, "{stored}");
        assert_eq!(stored["invoice_number"], "INV-00001");
        assert_eq!(amount(&stored["subtotal"]), dec!(350));
        assert_eq!(amount(&stored["tax_amount"]), dec!(38.50));
        assert_eq!(amount(&stored["total_amount"]), dec!(388.50));

        let (status, again) = send(&app, Method::POST, &format!("/api/v1/contracts/{id}/invoice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(again["created"], false);
        assert_eq!(again["invoice"]["id"], stored["id"]);
        assert_eq!(store.invoice_count().await, 1);
    }

    #[tokio::test]
    async fn test_open_contract_cannot_be_invoiced() {
        let (app, store, _) = app();
        let vehicle_id = create_vehicle(&app, "S-3").await;
        let opened = open_contract(&app, &vehicle_id).await;
        let id = opened["contract"]["id"].as_str().unwrap();

        let (status, _) = send(&app, Method::POST, &format!("/api/v1/contracts/{id}/invoice"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(store.invoice_count().await, 0);
    }

    #[tokio::test]
    async fn test_payment_transitions() {
        let (app, _, _) = app();
        let id = settled(&app).await;
        let (_, issued) = send(&app, Method::GET, &format!("/api/v1/contracts/{id}/invoice"), None).await;
        let invoice_id = issued["id"].as_str().unwrap();

        let (status, paid) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/invoices/{invoice_id}/payment"),
            Some(json!({ "payment_status": "paid", "payment_method": "cash" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{paid}");
        assert_eq!(paid["payment_status"], "paid");
        assert!(!paid["paid_at"].is_null());

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/invoices/{invoice_id}/payment"),
            Some(json!({ "payment_status": "pending" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, listed) = send(&app, Method::GET, "/api/v1/invoices?status=paid", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overdue_sweep() {
        let (app, _, clock) = app();
        settled(&app).await;

        let (_, swept) = send(&app, Method::POST, "/api/v1/invoices/mark-overdue", None).await;
        assert_eq!(swept["marked"], 0);

        clock.set(TemporalFixtures::at(2026, 7, 15, 9));
        let (status, swept) = send(&app, Method::POST, "/api/v1/invoices/mark-overdue", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(swept["marked"], 1);
        assert_eq!(swept["invoices"][0]["payment_status"], "overdue");
    }

    #[tokio::test]
    async fn test_invoice_for_uninvoiced_contract_is_not_found() {
        let (app, _, _) = app();
        let vehicle_id = create_vehicle(&app, "S-2").await;
        let opened = open_contract(&app, &vehicle_id).await;
        let id = opened["contract"]["id"].as_str().unwrap();

        let (status, _) = send(&app, Method::GET, &format!("/api/v1/contracts/{id}/invoice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

// ============================================================================
// Reports
// ============================================================================

mod report_tests {
    use super::*;

    #[tokio::test]
    async fn test_profitability_window() {
        let (app, _, _) = app();
        let vehicle_id = create_vehicle(&app, "R-1").await;
        open_contract(&app, &vehicle_id).await;

        let (status, report) = send(
            &app,
            Method::GET,
            "/api/v1/reports/profitability?start=2026-06-01&end=2026-06-30",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{report}");
        assert_eq!(report["contract_count"], 1);
        assert_eq!(amount(&report["total_revenue"]), dec!(350));
    }

    #[tokio::test]
    async fn test_reversed_window_is_rejected() {
        let (app, _, _) = app();
        let (status, _) = send(
            &app,
            Method::GET,
            "/api/v1/reports/profitability?start=2026-06-30&end=2026-06-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
