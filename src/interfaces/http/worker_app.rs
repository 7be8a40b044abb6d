//! A worker process's HTTP surface: the `health` /
//! `check-schedule` / `execute` / `signal` quartet every service exposes,
//! plus the `user` service's profile/stocks/model/wanted-services routes
//! mounted only when `kind == ServiceKind::User`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::worker::{Worker, SYSTEM_DEFAULT_USER};
use crate::domain::ports::UserConfigStore;
use crate::domain::service_kind::ServiceKind;
use crate::interfaces::http::dto::{
    CheckScheduleResponse, ExecuteResponse, HealthResponse, SignalResponse, UserHeaderQuery,
};
use crate::interfaces::http::error::ApiError;
use crate::interfaces::http::middleware::request_id;
use crate::interfaces::http::user_routes;

#[derive(Clone)]
pub struct WorkerState {
    pub worker: Arc<Worker>,
    pub user_store: Arc<dyn UserConfigStore>,
}

pub fn build_worker_router(state: WorkerState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/check-schedule", post(check_schedule))
        .route("/execute", post(execute))
        .route("/signal", get(signal));

    if state.worker.kind == ServiceKind::User {
        router = router.merge(user_routes::router());
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(axum::middleware::from_fn(request_id))
        .with_state(state)
}

/// Resolves the acting user from `X-User-ID`, falling back to the query
/// string, then to the worker's system default.
fn resolve_user_id(headers: &HeaderMap, query: &UserHeaderQuery) -> Option<String> {
    headers
        .get("X-User-ID")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| query.user_id.clone())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

async fn check_schedule(
    State(state): State<WorkerState>,
    headers: HeaderMap,
    Query(query): Query<UserHeaderQuery>,
) -> Result<Json<CheckScheduleResponse>, ApiError> {
    let user_id = resolve_user_id(&headers, &query);
    let outcome = state
        .worker
        .check_schedule(chrono::Utc::now(), user_id.as_deref())
        .await
        .map_err(|e| ApiError::new(e, "/check-schedule"))?;
    Ok(Json(CheckScheduleResponse {
        executed: outcome.executed,
        message: outcome.message,
        details: outcome.details,
    }))
}

async fn execute(
    State(state): State<WorkerState>,
    headers: HeaderMap,
    Query(query): Query<UserHeaderQuery>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let user_id = resolve_user_id(&headers, &query);
    let outcome = state
        .worker
        .execute(user_id.as_deref())
        .await
        .map_err(|e| ApiError::new(e, "/execute"))?;
    Ok(Json(ExecuteResponse {
        success: outcome.executed,
        message: outcome.message,
        details: outcome.details,
    }))
}

async fn signal(
    State(state): State<WorkerState>,
    headers: HeaderMap,
    Query(query): Query<UserHeaderQuery>,
) -> Result<Json<SignalResponse>, ApiError> {
    let user_id = resolve_user_id(&headers, &query).unwrap_or_else(|| SYSTEM_DEFAULT_USER.to_string());
    match state.worker.latest_signal(&user_id) {
        Some(signal) => Ok(Json(SignalResponse::found(signal))),
        None => Ok(Json(SignalResponse::none())),
    }
}
