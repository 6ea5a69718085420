//! End-to-end tests over the HTTP surface, backed by the in-memory store.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use poolrota::models::{BillingMode, CourseType, Role, Shift, User};
use poolrota::startup::build_router;
use poolrota::store::MemoryStore;
use poolrota::{AppConfig, AppState};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        bind_addr: "127.0.0.1:0".to_string(),
        strict_rates: false,
    }
}

fn router_over(store: Arc<MemoryStore>) -> Router {
    let state = Arc::new(AppState::new(
        test_config(),
        store.clone(),
        store.clone(),
        store,
    ));
    build_router(state)
}

struct Fixture {
    store: Arc<MemoryStore>,
    anna_shift: Uuid,
}

/// Three users, one course, one lifeguard shift held by Anna and a pair of
/// instructor shifts for payroll.
fn seeded() -> Fixture {
    let store = Arc::new(MemoryStore::new());

    for (id, first, last) in [(1, "Anna", "Rossi"), (2, "Luca", "Bianchi"), (3, "Sara", "Verdi")] {
        store.insert_user(User {
            id,
            username: format!("u{id}"),
            first_name: first.to_string(),
            last_name: last.to_string(),
        });
    }

    store.insert_course_type(CourseType {
        id: 1,
        name: "Scuola Nuoto".to_string(),
        default_minutes: Some(40),
        base_rate: dec("25.00"),
        billing: BillingMode::PerTurn,
    });
    store.set_category_rate(Role::Lifeguard, dec("12.00"));

    let anna_shift = Uuid::new_v4();
    store.insert_shift(Shift {
        id: anna_shift,
        date: d(2025, 3, 10),
        role: Role::Lifeguard,
        start_time: t(8, 0),
        end_time: t(12, 0),
        user_id: 1,
        course_type_id: None,
    });

    for day in [3, 5] {
        store.insert_shift(Shift {
            id: Uuid::new_v4(),
            date: d(2025, 3, day),
            role: Role::Instructor,
            start_time: t(17, 0),
            end_time: t(17, 40),
            user_id: 2,
            course_type_id: Some(1),
        });
    }

    Fixture { store, anna_shift }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let router = router_over(Arc::new(MemoryStore::new()));

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn month_view_lists_shifts_with_names() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    let (status, body) = get(&router, "/api/shifts?user_id=1&year=2025&month=3").await;
    assert_eq!(status, StatusCode::OK);
    let shifts = body.as_array().unwrap();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0]["user_name"], "Anna Rossi");
    assert_eq!(shifts[0]["role"], "lifeguard");
    assert!(shifts[0]["replacement_info"].is_null());
}

#[tokio::test]
async fn invalid_month_is_a_bad_request() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    let (status, body) = get(&router, "/api/shifts?year=2025&month=13").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn replacement_flow_create_accept_and_overlay() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    // Anna offers her shift to Luca and Sara.
    let (status, body) = post(
        &router,
        "/api/replacements",
        json!({
            "shift_id": fixture.anna_shift,
            "requester_id": 1,
            "target_users": [2, 3]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids = body["request_ids"].as_array().unwrap().clone();
    assert_eq!(ids.len(), 2);

    // Luca accepts.
    let (status, body) = post(
        &router,
        &format!("/api/replacements/{}/respond", ids[0]),
        json!({"action": "accept"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    // Sara's copy was cascade-cancelled by Luca's acceptance.
    let (status, body) = get(&router, "/api/replacements/received?user_id=3").await;
    assert_eq!(status, StatusCode::OK);
    let sara = &body["requests"][0];
    assert_eq!(sara["status"], "cancelled");
    assert_eq!(sara["closed_by"], 2);
    assert_eq!(sara["closed_by_name"], "Luca Bianchi");

    // The week view still shows Anna as the holder, with the overlay set.
    let (status, body) = get(&router, "/api/shifts/week?start_date=2025-03-10").await;
    assert_eq!(status, StatusCode::OK);
    let shifts = body.as_array().unwrap();
    let annotated = shifts
        .iter()
        .find(|s| s["id"] == json!(fixture.anna_shift))
        .unwrap();
    assert_eq!(annotated["user_id"], 1);
    let info = &annotated["replacement_info"];
    assert_eq!(info["accepted"], true);
    assert_eq!(info["accepted_by_name"], "Luca Bianchi");
    assert_eq!(info["requester_name"], "Anna Rossi");
    assert_eq!(info["original_start"], "08:00:00");
}

#[tokio::test]
async fn losing_accept_conflicts_after_sibling_won() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    let (_, body) = post(
        &router,
        "/api/replacements",
        json!({
            "shift_id": fixture.anna_shift,
            "requester_id": 1,
            "target_users": [2, 3]
        }),
    )
    .await;
    let ids = body["request_ids"].as_array().unwrap().clone();

    let (status, _) = post(
        &router,
        &format!("/api/replacements/{}/respond", ids[0]),
        json!({"action": "accept"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &router,
        &format!("/api/replacements/{}/respond", ids[1]),
        json!({"action": "accept"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "REQUEST_NOT_PENDING");
}

#[tokio::test]
async fn unknown_shift_is_not_found() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    let (status, body) = post(
        &router,
        "/api/replacements",
        json!({
            "shift_id": Uuid::new_v4(),
            "requester_id": 1,
            "target_users": [2]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SHIFT_NOT_FOUND");
}

#[tokio::test]
async fn bad_partial_window_is_unprocessable() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    let (status, body) = post(
        &router,
        "/api/replacements",
        json!({
            "shift_id": fixture.anna_shift,
            "requester_id": 1,
            "target_users": [2],
            "partial": true,
            "partial_start": "07:00:00",
            "partial_end": "10:00:00"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_PARTIAL_RANGE");
}

#[tokio::test]
async fn sent_listing_embeds_shift_snapshot() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    post(
        &router,
        "/api/replacements",
        json!({
            "shift_id": fixture.anna_shift,
            "requester_id": 1,
            "target_users": [2]
        }),
    )
    .await;

    let (status, body) = get(&router, "/api/replacements/sent?user_id=1").await;
    assert_eq!(status, StatusCode::OK);
    let request = &body["requests"][0];
    assert_eq!(request["status"], "pending");
    assert_eq!(request["target_user_name"], "Luca Bianchi");
    assert_eq!(request["shift"]["date"], "2025-03-10");
    assert_eq!(request["shift"]["start_time"], "08:00:00");
}

#[tokio::test]
async fn ack_marker_round_trips_through_listings() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    post(
        &router,
        "/api/replacements",
        json!({
            "shift_id": fixture.anna_shift,
            "requester_id": 1,
            "target_users": [2]
        }),
    )
    .await;

    let (_, before) = get(&router, "/api/replacements/received?user_id=2").await;
    assert!(before["last_acknowledged"].is_null());

    let (status, ack) = post(&router, "/api/replacements/ack?user_id=2", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["user_id"], 2);

    let (_, after) = get(&router, "/api/replacements/received?user_id=2").await;
    assert_eq!(after["last_acknowledged"], ack["last_acknowledged"]);
}

#[tokio::test]
async fn only_pending_filter_applies_to_received() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    let (_, body) = post(
        &router,
        "/api/replacements",
        json!({
            "shift_id": fixture.anna_shift,
            "requester_id": 1,
            "target_users": [2]
        }),
    )
    .await;
    let id = body["request_ids"][0].clone();

    post(
        &router,
        &format!("/api/replacements/{id}/respond"),
        json!({"action": "reject"}),
    )
    .await;

    let (_, pending) =
        get(&router, "/api/replacements/received?user_id=2&only_pending=true").await;
    assert_eq!(pending["requests"].as_array().unwrap().len(), 0);

    let (_, all) = get(&router, "/api/replacements/received?user_id=2").await;
    assert_eq!(all["requests"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn payroll_breakdown_prices_hours_and_turns() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    // Anna: one four-hour lifeguard shift at 12.00.
    let (status, body) = get(&router, "/api/payroll/1?year=2025&month=3").await;
    assert_eq!(status, StatusCode::OK);
    let lines = body["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["label"], "Lifeguard");
    assert_eq!(lines[0]["unit"], "hours");
    assert_eq!(lines[0]["quantity"], "4");
    assert_eq!(lines[0]["subtotal"], "48.00");
    assert_eq!(body["total"], "48.00");

    // Luca: two swim school turns at 25.00.
    let (status, body) = get(&router, "/api/payroll/2?year=2025&month=3").await;
    assert_eq!(status, StatusCode::OK);
    let lines = body["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["label"], "Scuola Nuoto");
    assert_eq!(lines[0]["unit"], "turns");
    assert_eq!(lines[0]["quantity"], "2");
    assert_eq!(lines[0]["subtotal"], "50.00");
}

#[tokio::test]
async fn payroll_flags_unconfigured_rates() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(User {
        id: 1,
        username: "u1".to_string(),
        first_name: "Anna".to_string(),
        last_name: "Rossi".to_string(),
    });
    store.insert_shift(Shift {
        id: Uuid::new_v4(),
        date: d(2025, 3, 10),
        role: Role::Reception,
        start_time: t(8, 0),
        end_time: t(12, 0),
        user_id: 1,
        course_type_id: None,
    });
    let router = router_over(store);

    let (status, body) = get(&router, "/api/payroll/1?year=2025&month=3").await;
    assert_eq!(status, StatusCode::OK);
    let line = &body["lines"][0];
    assert_eq!(line["rate"], "0");
    assert_eq!(line["rate_unconfigured"], true);
}

#[tokio::test]
async fn reference_endpoints_serve_users_and_courses() {
    let fixture = seeded();
    let router = router_over(fixture.store);

    let (status, users) = get(&router, "/api/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 3);

    let (status, courses) = get(&router, "/api/courses/types").await;
    assert_eq!(status, StatusCode::OK);
    let course = &courses.as_array().unwrap()[0];
    assert_eq!(course["name"], "Scuola Nuoto");
    assert_eq!(course["billing"], "per_turn");
    assert_eq!(course["base_rate"], "25.00");
}

#[tokio::test]
async fn docs_ui_is_served() {
    let router = router_over(Arc::new(MemoryStore::new()));

    let response = router
        .oneshot(Request::builder().uri("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<html"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let router = router_over(Arc::new(MemoryStore::new()));

    let (status, body) = get(&router, "/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/replacements"].is_object());
    assert!(body["paths"]["/api/payroll/{user_id}"].is_object());
}
