//! The gateway process's HTTP surface: fabric-level summary and admin
//! routes, plus the `/api/<service>/...` catch-all that drives
//! `FabricGateway::route`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::response::IntoResponse;
use axum::routing::{any, get, post};
use axum::{Json, Router};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::gateway::{FabricGateway, ForwardRequest};
use crate::domain::ports::KVCache;
use crate::domain::service_kind::ServiceKind;
use crate::infrastructure::observability::Metrics;
use crate::interfaces::http::dto::{
    CacheStatsResponse, CircuitBreakerStatusEntry, CircuitBreakerStatusResponse, FabricSummaryResponse,
    HealthResponse, ServiceStatusEntry, ServicesStatusResponse, ToggleResponse,
};
use crate::interfaces::http::error::{not_found, ApiError};
use crate::interfaces::http::middleware::request_id;

#[derive(Clone)]
pub struct GatewayState {
    pub gateway: Arc<FabricGateway>,
    pub cache: Arc<dyn KVCache>,
    pub metrics: Arc<Metrics>,
}

pub fn build_gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(summary))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/services/status", get(services_status))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/clear", post(cache_clear))
        .route("/cache/warm-up", post(cache_warm_up))
        .route("/circuit-breaker/status", get(circuit_breaker_status))
        .route("/circuit-breaker/:service/reset", post(circuit_breaker_reset))
        .route("/services/:service/toggle", post(service_toggle))
        .route("/api/*rest", any(forward))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(axum::middleware::from_fn(request_id))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

async fn metrics(State(state): State<GatewayState>) -> String {
    state.metrics.render()
}

async fn service_status_map(state: &GatewayState) -> HashMap<String, ServiceStatusEntry> {
    let snapshot = state.gateway.health_snapshot().await;
    snapshot
        .into_iter()
        .map(|(kind, (_health, healthy_instances, breaker_state))| {
            let enabled = state
                .gateway
                .descriptor(kind)
                .map(|d| d.is_enabled())
                .unwrap_or(false);
            (
                kind.to_string(),
                ServiceStatusEntry {
                    phase: crate::domain::market_phase::phase_at(chrono::Utc::now()),
                    healthy_instances,
                    breaker_state,
                    enabled,
                },
            )
        })
        .collect()
}

async fn services_status(State(state): State<GatewayState>) -> Json<ServicesStatusResponse> {
    Json(ServicesStatusResponse {
        services: service_status_map(&state).await,
    })
}

async fn summary(State(state): State<GatewayState>) -> Json<FabricSummaryResponse> {
    Json(FabricSummaryResponse {
        name: "service-fabric",
        version: env!("CARGO_PKG_VERSION"),
        services: service_status_map(&state).await,
    })
}

async fn cache_stats(State(state): State<GatewayState>) -> Json<CacheStatsResponse> {
    let stats = state.cache.stats().await;
    Json(CacheStatsResponse {
        entries: stats.entries,
        hits: stats.hits,
        misses: stats.misses,
    })
}

async fn cache_clear(State(state): State<GatewayState>) -> Json<CacheStatsResponse> {
    state.gateway.clear_cache().await;
    let stats = state.cache.stats().await;
    Json(CacheStatsResponse {
        entries: stats.entries,
        hits: stats.hits,
        misses: stats.misses,
    })
}

/// `POST /cache/warm-up`: proactively issues a `GET /health` through the
/// forwarding path for every enabled service so its first real request
/// isn't the one that pays the cache-miss latency.
async fn cache_warm_up(State(state): State<GatewayState>) -> Json<ServicesStatusResponse> {
    for kind in ServiceKind::ALL {
        let Some(descriptor) = state.gateway.descriptor(kind) else {
            continue;
        };
        if !descriptor.is_enabled() {
            continue;
        }
        let _ = state
            .gateway
            .route(ForwardRequest {
                method: "GET".to_string(),
                path: format!("/api/{kind}/health"),
                query: Vec::new(),
                user_id: None,
                body: Vec::new(),
            })
            .await;
    }
    Json(ServicesStatusResponse {
        services: service_status_map(&state).await,
    })
}

async fn circuit_breaker_status(State(state): State<GatewayState>) -> Json<CircuitBreakerStatusResponse> {
    let mut breakers = Vec::with_capacity(ServiceKind::ALL.len());
    for kind in ServiceKind::ALL {
        if let Some(breaker) = state.gateway.breaker(kind) {
            breakers.push(CircuitBreakerStatusEntry {
                service: kind.to_string(),
                state: breaker.state().await.to_string(),
            });
        }
    }
    Json(CircuitBreakerStatusResponse { breakers })
}

async fn circuit_breaker_reset(
    State(state): State<GatewayState>,
    Path(service): Path<String>,
) -> Result<Json<CircuitBreakerStatusEntry>, ApiError> {
    let kind: ServiceKind = service
        .parse()
        .map_err(|_| not_found(&format!("/circuit-breaker/{service}/reset")))?;
    state.gateway.reset_breaker(kind).await;
    let state_str = state
        .gateway
        .breaker(kind)
        .expect("breaker exists for every ServiceKind")
        .state()
        .await
        .to_string();
    Ok(Json(CircuitBreakerStatusEntry {
        service: kind.to_string(),
        state: state_str,
    }))
}

async fn service_toggle(
    State(state): State<GatewayState>,
    Path(service): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let kind: ServiceKind = service
        .parse()
        .map_err(|_| not_found(&format!("/services/{service}/toggle")))?;
    let enabled = state
        .gateway
        .toggle_service(kind)
        .expect("descriptor exists for every ServiceKind");
    Ok(Json(ToggleResponse {
        service: kind.to_string(),
        enabled,
    }))
}

/// `/api/<service>/...` catch-all: translates the inbound axum request into
/// a `ForwardRequest` and lets `FabricGateway::route` do the rest.
async fn forward(State(state): State<GatewayState>, request: Request) -> Result<axum::response::Response, ApiError> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let query: Vec<(String, String)> = request
        .uri()
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();
    let user_id = request
        .headers()
        .get("X-User-ID")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map(|b| b.to_vec())
        .unwrap_or_default();

    let response = state
        .gateway
        .route(ForwardRequest {
            method,
            path,
            query,
            user_id,
            body,
        })
        .await
        .map_err(|e| ApiError::new(e, "/api"))?;

    let status = axum::http::StatusCode::from_u16(response.status)
        .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, response.body).into_response())
}
