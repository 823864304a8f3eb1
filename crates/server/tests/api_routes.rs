mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["database_ready"], true);
    assert!(response.request_id.is_some(), "x-request-id is propagated");
}

#[tokio::test]
async fn test_missing_and_invalid_tokens_are_rejected() {
    let app = TestApp::new().await;

    let missing = app.request(Method::GET, "/api/v1/events", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["success"], false);
    assert_eq!(missing.error(), "missing session token");

    let forged = app
        .request(Method::GET, "/api/v1/events", Some("not-a-token"), None)
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri("/api/v1/events")
        .header(header::COOKIE, format!("theme=dark; planner_session={}", app.token()))
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data(), &json!([]));
}

#[tokio::test]
async fn test_event_crud_round_trip() {
    let app = TestApp::new().await;

    let id = app
        .create(
            "/api/v1/events",
            json!({ "name": "Spring Gala", "event_type": "gala", "guest_count": 120 }),
        )
        .await;

    let fetched = app.get(&format!("/api/v1/events/{id}")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.data()["status"], "inquiry");

    let updated = app
        .put(&format!("/api/v1/events/{id}"), json!({ "venue": "Harbour Hall" }))
        .await;
    assert_eq!(updated.data()["venue"], "Harbour Hall");
    assert_eq!(updated.data()["name"], "Spring Gala");

    let listed = app.get("/api/v1/events?status=inquiry").await;
    assert_eq!(listed.data().as_array().unwrap().len(), 1);

    let deleted = app.delete(&format!("/api/v1/events/{id}")).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app.get(&format!("/api/v1/events/{id}")).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.error(), "event not found");
}

#[tokio::test]
async fn test_other_tenants_records_are_invisible() {
    let app = TestApp::new().await;
    let id = app
        .create("/api/v1/vendors", json!({ "name": "Bloom Co", "category": "florist" }))
        .await;

    let intruder = app.token_for(Uuid::new_v4());
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/vendors/{id}"),
            Some(&intruder),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let list = app
        .request(Method::GET, "/api/v1/vendors", Some(&intruder), None)
        .await;
    assert_eq!(list.data(), &json!([]));
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let app = TestApp::new().await;

    let blank = app.post("/api/v1/events", json!({ "name": "   " })).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.error(), "name is required");

    let rating = app
        .post(
            "/api/v1/vendors",
            json!({ "name": "DJ Sol", "category": "music", "rating": 7.5 }),
        )
        .await;
    assert_eq!(rating.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lead_is_scored_on_create_and_update() {
    let app = TestApp::new().await;

    let created = app
        .post(
            "/api/v1/leads",
            json!({ "name": "Riley Park", "budget": 10000, "source": "referral", "has_engaged": true }),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.data()["score"], 40);

    let id = created.data()["id"].as_str().unwrap();
    let updated = app
        .put(
            &format!("/api/v1/leads/{id}"),
            json!({ "source": "walk in", "has_engaged": false }),
        )
        .await;
    // budget 5 + unlisted source 5 + contacted without reply 10
    assert_eq!(updated.data()["score"], 20);

    let preview = app
        .post("/api/v1/leads/score", json!({ "budget": 10000 }))
        .await;
    assert_eq!(preview.data()["score"], 5);
    assert_eq!(preview.data()["category"], "cold");
}

#[tokio::test]
async fn test_lead_conversion_conflicts_on_repeat() {
    let app = TestApp::new().await;
    let id = app
        .create(
            "/api/v1/leads",
            json!({ "name": "Morgan Diaz", "event_type": "wedding", "guest_count": 90 }),
        )
        .await;

    let converted = app
        .post(&format!("/api/v1/leads/{id}/convert"), json!({}))
        .await;
    assert_eq!(converted.status, StatusCode::OK);
    assert_eq!(converted.data()["lead"]["status"], "won");
    assert_eq!(converted.data()["event"]["name"], "Morgan Diaz (wedding)");

    let again = app
        .post(&format!("/api/v1/leads/{id}/convert"), json!({}))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_lead_conversion_rejects_blank_name_override() {
    let app = TestApp::new().await;
    let id = app
        .create("/api/v1/leads", json!({ "name": "Sam Lee", "event_type": "gala" }))
        .await;

    let blank = app
        .post(&format!("/api/v1/leads/{id}/convert"), json!({ "name": "   " }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.error(), "name is required");

    let lead = app.get(&format!("/api/v1/leads/{id}")).await;
    assert!(lead.data()["converted_event_id"].is_null());
    let events = app.get("/api/v1/events").await;
    assert_eq!(events.data(), &json!([]));
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let app = TestApp::new().await;
    let event = app
        .create("/api/v1/events", json!({ "name": "Product Launch" }))
        .await;
    let vendor = app
        .create("/api/v1/vendors", json!({ "name": "Stage Pro", "category": "av" }))
        .await;

    let dangling = app
        .post(
            "/api/v1/bookings",
            json!({ "event_id": event, "vendor_id": Uuid::new_v4(), "service_description": "Lighting" }),
        )
        .await;
    assert_eq!(dangling.status, StatusCode::BAD_REQUEST);

    let too_much_deposit = app
        .post(
            "/api/v1/bookings",
            json!({
                "event_id": event, "vendor_id": vendor, "service_description": "Lighting",
                "amount": 500.0, "deposit_amount": 900.0
            }),
        )
        .await;
    assert_eq!(too_much_deposit.status, StatusCode::BAD_REQUEST);

    let booking = app
        .create(
            "/api/v1/bookings",
            json!({
                "event_id": event, "vendor_id": vendor, "service_description": "Lighting",
                "amount": 2500.0, "deposit_amount": 500.0
            }),
        )
        .await;

    let confirmed = app
        .post(&format!("/api/v1/bookings/{booking}/confirm"), json!({}))
        .await;
    assert_eq!(confirmed.status, StatusCode::OK);
    assert_eq!(confirmed.data()["status"], "confirmed");
    assert!(confirmed.data()["confirmed_at"].is_string());

    let declined = app
        .post(&format!("/api/v1/bookings/{booking}/decline"), json!({}))
        .await;
    assert_eq!(declined.status, StatusCode::CONFLICT);

    let vendor_delete = app.delete(&format!("/api/v1/vendors/{vendor}")).await;
    assert_eq!(vendor_delete.status, StatusCode::CONFLICT);
    assert_eq!(
        vendor_delete.error(),
        "record is still referenced by other records"
    );

    let summary = app.get(&format!("/api/v1/events/{event}/summary")).await;
    assert_eq!(summary.data()["bookings"]["committed_amount"], 2500.0);
}

#[tokio::test]
async fn test_event_budget_summary() {
    let app = TestApp::new().await;
    let event = app
        .create("/api/v1/events", json!({ "name": "Retreat", "budget": 5000.0 }))
        .await;

    for (category, planned, actual) in [("catering", 2000.0, 2400.0), ("venue", 1500.0, 1500.0)] {
        app.create(
            "/api/v1/budget-items",
            json!({
                "event_id": event, "category": category, "description": category,
                "planned_amount": planned, "actual_amount": actual
            }),
        )
        .await;
    }

    let budget = app.get(&format!("/api/v1/events/{event}/budget")).await;
    assert_eq!(budget.status, StatusCode::OK);
    let data = budget.data();
    assert_eq!(data["total_planned"], 3500.0);
    assert_eq!(data["total_actual"], 3900.0);
    assert_eq!(data["over_budget"], true);
    assert_eq!(data["event_budget"], 5000.0);
    assert_eq!(data["categories"][0]["category"], "catering");
}

#[tokio::test]
async fn test_status_transitions() {
    let app = TestApp::new().await;
    let task = app
        .create("/api/v1/tasks", json!({ "title": "Send invitations" }))
        .await;

    let done = app
        .post(&format!("/api/v1/tasks/{task}/complete"), json!({}))
        .await;
    assert_eq!(done.data()["status"], "done");
    assert!(done.data()["completed_at"].is_string());

    let again = app
        .post(&format!("/api/v1/tasks/{task}/complete"), json!({}))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let reopened = app
        .post(
            &format!("/api/v1/tasks/{task}/status"),
            json!({ "status": "todo" }),
        )
        .await;
    assert_eq!(reopened.data()["status"], "todo");
    assert!(reopened.data()["completed_at"].is_null());

    let event = app.create("/api/v1/events", json!({ "name": "Summit" })).await;
    let skipped = app
        .post(
            &format!("/api/v1/events/{event}/status"),
            json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(skipped.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_payments_mark_overdue_and_pay() {
    let app = TestApp::new().await;
    let event = app.create("/api/v1/events", json!({ "name": "Fundraiser" })).await;
    let payment = app
        .create(
            "/api/v1/payments",
            json!({
                "event_id": event, "description": "Deposit invoice", "amount": 750.0,
                "due_date": "2020-01-15"
            }),
        )
        .await;

    let marked = app.post("/api/v1/payments/mark-overdue", json!({})).await;
    assert_eq!(marked.data()["updated"], 1);

    let listed = app.get(&format!("/api/v1/events/{event}/payments")).await;
    assert_eq!(listed.data()[0]["status"], "overdue");

    let paid = app
        .post(&format!("/api/v1/payments/{payment}/mark-paid"), json!({}))
        .await;
    assert_eq!(paid.data()["status"], "paid");
    assert!(paid.data()["paid_at"].is_string());
}

#[tokio::test]
async fn test_rate_limit_per_tenant() {
    let app = TestApp::with_rate_limit(2).await;

    assert_eq!(app.get("/api/v1/events").await.status, StatusCode::OK);
    assert_eq!(app.get("/api/v1/events").await.status, StatusCode::OK);

    let limited = app.get("/api/v1/events").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.error(), "rate limit exceeded");

    // Another organization has its own bucket.
    let other = app.token_for(Uuid::new_v4());
    let response = app
        .request(Method::GET, "/api/v1/events", Some(&other), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_pagination_is_clamped() {
    let app = TestApp::new().await;
    for n in 0..3 {
        app.create("/api/v1/tasks", json!({ "title": format!("Task {n}") }))
            .await;
    }

    let page = app.get("/api/v1/tasks?limit=2&offset=0").await;
    assert_eq!(page.data().as_array().unwrap().len(), 2);

    let rest = app.get("/api/v1/tasks?limit=2&offset=2").await;
    assert_eq!(rest.data().as_array().unwrap().len(), 1);

    let zero = app.get("/api/v1/tasks?limit=0").await;
    assert_eq!(zero.data().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_event_records_update_and_delete() {
    let app = TestApp::new().await;
    let event = app.create("/api/v1/events", json!({ "name": "Awards Night" })).await;
    let vendor = app
        .create("/api/v1/vendors", json!({ "name": "Fresh Table", "category": "catering" }))
        .await;

    let booking = app
        .create(
            "/api/v1/bookings",
            json!({
                "event_id": event, "vendor_id": vendor, "service_description": "Dinner",
                "amount": 4000.0
            }),
        )
        .await;
    let item = app
        .create(
            "/api/v1/budget-items",
            json!({ "event_id": event, "category": "catering", "description": "Dinner" }),
        )
        .await;
    let payment = app
        .create(
            "/api/v1/payments",
            json!({ "event_id": event, "description": "Catering deposit", "amount": 400.0 }),
        )
        .await;
    let slot = app
        .create(
            "/api/v1/timeline-items",
            json!({ "event_id": event, "title": "Doors open", "starts_at": "2026-11-20T18:00:00Z" }),
        )
        .await;

    let updates = [
        (format!("/api/v1/bookings/{booking}"), json!({ "deposit_amount": 900.0 }), "deposit_amount", json!(900.0)),
        (format!("/api/v1/budget-items/{item}"), json!({ "planned_amount": 3800.0 }), "planned_amount", json!(3800.0)),
        (format!("/api/v1/payments/{payment}"), json!({ "method": "card" }), "method", json!("card")),
        (format!("/api/v1/timeline-items/{slot}"), json!({ "location": "Lobby" }), "location", json!("Lobby")),
    ];
    for (uri, body, field, expected) in &updates {
        let response = app.put(uri, body.clone()).await;
        assert_eq!(response.status, StatusCode::OK, "PUT {uri}: {}", response.body);
        assert_eq!(&response.data()[*field], expected);
    }

    for (uri, ..) in &updates {
        assert_eq!(app.delete(uri).await.status, StatusCode::OK, "DELETE {uri}");
        assert_eq!(app.get(uri).await.status, StatusCode::NOT_FOUND);
    }

    // With its booking gone the vendor can be removed.
    let vendor_delete = app.delete(&format!("/api/v1/vendors/{vendor}")).await;
    assert_eq!(vendor_delete.status, StatusCode::OK);
}
