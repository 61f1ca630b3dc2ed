//! REST API handlers.
//!
//! Each handler waits out the configured latency, talks to the
//! `ServiceRepository`, and answers with bare JSON. Failures use
//! `{"error": "..."}` bodies.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{info, warn};

use monito_sim::EVENT_POOL_SIZE;
use monito_state::{ServiceDraft, ServicePatch, StateError};

use crate::ApiState;

/// Default page size for event listings.
pub const DEFAULT_EVENT_LIMIT: usize = 10;

fn error_response(msg: &str, status: StatusCode) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

/// Map a store error onto its HTTP status.
fn state_error(e: StateError) -> Response {
    match &e {
        StateError::Validation(msg) => error_response(msg, StatusCode::BAD_REQUEST),
        StateError::NotFound(_) => error_response("Not found", StatusCode::NOT_FOUND),
        _ => {
            warn!(error = %e, "store operation failed");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn bad_body(rejection: JsonRejection) -> Response {
    error_response(&rejection.body_text(), StatusCode::BAD_REQUEST)
}

fn missing_id_response() -> Response {
    error_response("Service ID is required", StatusCode::BAD_REQUEST)
}

// ── Services ───────────────────────────────────────────────────

/// GET /services
pub async fn list_services(State(state): State<ApiState>) -> impl IntoResponse {
    state.latency.pause().await;
    match state.store.list_services() {
        Ok(services) => Json(state.simulator.observe_all(services)).into_response(),
        Err(e) => state_error(e),
    }
}

/// GET /services/{id}
pub async fn get_service(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.latency.pause().await;
    if id.trim().is_empty() {
        return missing_id_response();
    }
    match state.store.get_service(&id) {
        Ok(service) => Json(state.simulator.observe(service)).into_response(),
        Err(e) => state_error(e),
    }
}

/// POST /services
pub async fn create_service(
    State(state): State<ApiState>,
    payload: Result<Json<ServiceDraft>, JsonRejection>,
) -> impl IntoResponse {
    state.latency.pause().await;
    let Json(draft) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    match state.store.create_service(draft) {
        Ok(service) => {
            info!(id = %service.id, name = %service.name, "service created");
            (StatusCode::CREATED, Json(service)).into_response()
        }
        Err(e) => state_error(e),
    }
}

/// PUT /services/{id}
pub async fn update_service(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<ServicePatch>, JsonRejection>,
) -> impl IntoResponse {
    state.latency.pause().await;
    if id.trim().is_empty() {
        return missing_id_response();
    }
    let Json(patch) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    match state.store.update_service(&id, patch) {
        Ok(service) => {
            info!(%id, status = %service.status, "service updated");
            Json(service).into_response()
        }
        Err(e) => state_error(e),
    }
}

/// DELETE /services/{id}
pub async fn delete_service(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.latency.pause().await;
    match state.store.delete_service(&id) {
        Ok(()) => {
            state.events.forget(&id);
            info!(%id, "service deleted");
            Json(json!({ "success": true })).into_response()
        }
        Err(e) => state_error(e),
    }
}

/// Any verb on `/services/` with an empty id segment.
pub async fn missing_id() -> impl IntoResponse {
    missing_id_response()
}

// ── Events ─────────────────────────────────────────────────────

/// Query string of the events endpoint.
#[derive(Debug, Default, serde::Deserialize)]
pub struct EventQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// GET /services/{id}/events?page&limit
pub async fn list_events(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<EventQuery>,
) -> impl IntoResponse {
    state.latency.pause().await;
    if let Err(e) = state.store.get_service(&id) {
        return state_error(e);
    }
    let page = query.page.unwrap_or(0);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .min(EVENT_POOL_SIZE);
    let events = state.events.page(&id, page, limit);
    // A delete may have landed while paging; don't keep a pool for it.
    if let Err(e) = state.store.get_service(&id) {
        state.events.forget(&id);
        return state_error(e);
    }
    Json(events).into_response()
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> &'static str {
    "OK"
}
