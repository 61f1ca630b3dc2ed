//! Router-level tests.
//!
//! Drives the full axum router with `oneshot` requests, the way the
//! dashboard front end would call it.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use monito_api::{ApiState, build_router};
use monito_sim::{EventLog, Simulator};
use monito_state::StateStore;

fn router_with(store: StateStore) -> Router {
    let state = ApiState::new(store)
        .with_simulator(Simulator::seeded(3).without_flapping())
        .with_events(EventLog::seeded(3));
    build_router(state)
}

fn empty_router() -> Router {
    router_with(StateStore::open_in_memory().unwrap())
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn list_services_empty() {
    let router = empty_router();
    let (status, body) = send(&router, "GET", "/services", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn seeded_catalog_is_served_under_api_prefix() {
    let router = router_with(StateStore::open_seeded().unwrap());
    let (status, body) = send(&router, "GET", "/api/services", None).await;
    assert_eq!(status, StatusCode::OK);

    let services = body.as_array().unwrap();
    assert_eq!(services.len(), 5);
    for svc in services {
        match svc["status"].as_str().unwrap() {
            "Offline" => assert!(svc.get("responseTime").is_none()),
            _ => {
                let rt = svc["responseTime"].as_u64().unwrap();
                assert!((50..=549).contains(&rt));
            }
        }
    }
}

#[tokio::test]
async fn create_update_delete_round_trip() {
    let router = empty_router();

    let (status, created) = send(
        &router,
        "POST",
        "/services",
        Some(json!({ "name": "X", "type": "API", "status": "Online" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["uptime"], json!(100.0));
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let (_, list) = send(&router, "GET", "/services", None).await;
    let matching: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["name"] == "X")
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0]["uptime"], json!(100.0));

    let (status, updated) = send(
        &router,
        "PUT",
        &format!("/services/{id}"),
        Some(json!({ "status": "Offline" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Offline");
    assert_eq!(updated["name"], "X");

    let (status, fetched) = send(&router, "GET", &format!("/services/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "Offline");
    assert!(fetched.get("responseTime").is_none());

    let (status, body) = send(&router, "DELETE", &format!("/services/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, list) = send(&router, "GET", "/services", None).await;
    assert!(list.as_array().unwrap().iter().all(|s| s["id"] != json!(id)));

    let (status, _) = send(&router, "DELETE", &format!("/services/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_validation_errors_are_400() {
    let router = empty_router();

    let (status, body) = send(
        &router,
        "POST",
        "/services",
        Some(json!({ "type": "API", "status": "Online" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("name"));

    let (status, _) = send(
        &router,
        "POST",
        "/services",
        Some(json!({ "name": "X", "type": "Mainframe", "status": "Online" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_id_is_400_and_unknown_id_is_404() {
    let router = empty_router();
    let (status, _) = send(&router, "GET", "/services/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&router, "GET", "/services/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("error").is_some());

    let (status, _) = send(
        &router,
        "PUT",
        "/services/999",
        Some(json!({ "status": "Online" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn events_paginate_over_stable_history() {
    let router = router_with(StateStore::open_seeded().unwrap());

    let (status, first) = send(&router, "GET", "/services/1/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first.as_array().unwrap().len(), 10);

    let (_, again) = send(&router, "GET", "/services/1/events?page=0&limit=10", None).await;
    assert_eq!(first, again);

    let mut total = 0;
    for page in 0..5 {
        let (_, events) = send(&router, "GET", &format!("/services/1/events?page={page}&limit=10"), None).await;
        let events = events.as_array().unwrap().clone();
        let stamps: Vec<_> = events
            .iter()
            .map(|e| e["timestamp"].as_str().unwrap().to_string())
            .collect();
        let parsed: Vec<chrono::DateTime<chrono::Utc>> =
            stamps.iter().map(|s| s.parse().unwrap()).collect();
        assert!(parsed.windows(2).all(|w| w[0] >= w[1]));
        total += events.len();
    }
    assert_eq!(total, 50);

    let (_, tail) = send(&router, "GET", "/services/1/events?page=5&limit=10", None).await;
    assert_eq!(tail, json!([]));

    let (_, capped) = send(&router, "GET", "/services/1/events?limit=500", None).await;
    assert_eq!(capped.as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn events_for_unknown_service_is_404() {
    let router = empty_router();
    let (status, _) = send(&router, "GET", "/services/7/events", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn healthz_is_ok() {
    let router = empty_router();
    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}
