//! `user` worker routes: profile registration/lookup, stock
//! watchlist management, LLM model choice and the aggregated config snapshot.
//! Mounted only on the `user` service's `WorkerApp` router — every other
//! service exposes just the `health`/`check-schedule`/`execute`/`signal`
//! quartet from `worker_app`.

use std::collections::HashSet;
use std::str::FromStr;

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::domain::user_config::{LlmKind, TickerCode, UserConfigPatch};
use crate::interfaces::http::dto::{
    ModelRequest, ModelResponse, RegisterProfileRequest, StocksRequest, StocksResponse,
    UpdateProfileRequest, UserConfigResponse, WantedServicesRequest, WantedServicesResponse,
};
use crate::interfaces::http::error::ApiError;
use crate::interfaces::http::worker_app::WorkerState;

pub fn router() -> Router<WorkerState> {
    Router::new()
        .route("/users/profile", post(register_profile))
        .route("/users/:id/profile", get(get_profile).put(update_profile))
        .route(
            "/users/:id/stocks",
            get(get_stocks).post(add_stocks),
        )
        .route("/users/:id/stocks/:code", axum::routing::delete(remove_stock))
        .route("/users/:id/stocks/batch", post(replace_stocks))
        .route("/users/:id/model", get(get_model).post(set_model))
        .route("/users/:id/config", get(get_config))
        .route(
            "/users/:id/wanted-services",
            get(get_wanted_services)
                .post(set_wanted_services)
                .put(set_wanted_services),
        )
}

async fn register_profile(
    State(state): State<WorkerState>,
    Json(body): Json<RegisterProfileRequest>,
) -> Result<Json<UserConfigResponse>, ApiError> {
    state
        .user_store
        .register_profile(&body.user_id, body.phone.as_deref())
        .await
        .map_err(|e| ApiError::new(e, "/users/profile"))?;
    let cfg = state
        .user_store
        .get_user_config(&body.user_id)
        .await
        .map_err(|e| ApiError::new(e, "/users/profile"))?;
    Ok(Json(cfg.into()))
}

async fn get_profile(
    State(state): State<WorkerState>,
    Path(id): Path<String>,
) -> Result<Json<UserConfigResponse>, ApiError> {
    let cfg = state
        .user_store
        .get_user_config(&id)
        .await
        .map_err(|e| ApiError::new(e, format!("/users/{id}/profile")))?;
    Ok(Json(cfg.into()))
}

async fn update_profile(
    State(state): State<WorkerState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserConfigResponse>, ApiError> {
    let path = format!("/users/{id}/profile");
    let llm_choice = body
        .llm_choice
        .map(|s| LlmKind::from_str(&s))
        .transpose()
        .map_err(|e| ApiError::new(crate::domain::errors::FabricError::Invalid(e), path.clone()))?;

    let patch = UserConfigPatch {
        thresholds: body.thresholds,
        llm_choice,
        notify: body.notify_chat_id.map(|chat_id| crate::domain::user_config::NotifyConfig {
            chat_id: Some(chat_id),
            per_service: Default::default(),
        }),
        ..Default::default()
    };
    state
        .user_store
        .update_user_config(&id, patch)
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?;
    let cfg = state
        .user_store
        .get_user_config(&id)
        .await
        .map_err(|e| ApiError::new(e, path))?;
    Ok(Json(cfg.into()))
}

async fn get_stocks(
    State(state): State<WorkerState>,
    Path(id): Path<String>,
) -> Result<Json<StocksResponse>, ApiError> {
    let tickers = state
        .user_store
        .get_user_stocks(&id)
        .await
        .map_err(|e| ApiError::new(e, format!("/users/{id}/stocks")))?;
    Ok(Json(StocksResponse {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
    }))
}

async fn add_stocks(
    State(state): State<WorkerState>,
    Path(id): Path<String>,
    Json(body): Json<StocksRequest>,
) -> Result<Json<StocksResponse>, ApiError> {
    let path = format!("/users/{id}/stocks");
    let mut current: HashSet<TickerCode> = state
        .user_store
        .get_user_stocks(&id)
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?
        .into_iter()
        .collect();
    for raw in &body.tickers {
        let ticker = TickerCode::parse(raw)
            .map_err(|e| ApiError::new(crate::domain::errors::FabricError::Invalid(e), path.clone()))?;
        current.insert(ticker);
    }
    state
        .user_store
        .set_user_stocks(&id, current.into_iter().collect())
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?;
    let tickers = state
        .user_store
        .get_user_stocks(&id)
        .await
        .map_err(|e| ApiError::new(e, path))?;
    Ok(Json(StocksResponse {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
    }))
}

async fn remove_stock(
    State(state): State<WorkerState>,
    Path((id, code)): Path<(String, String)>,
) -> Result<Json<StocksResponse>, ApiError> {
    let path = format!("/users/{id}/stocks/{code}");
    let target = TickerCode::parse(&code)
        .map_err(|e| ApiError::new(crate::domain::errors::FabricError::Invalid(e), path.clone()))?;
    let remaining: Vec<TickerCode> = state
        .user_store
        .get_user_stocks(&id)
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?
        .into_iter()
        .filter(|t| *t != target)
        .collect();
    state
        .user_store
        .set_user_stocks(&id, remaining)
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?;
    let tickers = state
        .user_store
        .get_user_stocks(&id)
        .await
        .map_err(|e| ApiError::new(e, path))?;
    Ok(Json(StocksResponse {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
    }))
}

async fn replace_stocks(
    State(state): State<WorkerState>,
    Path(id): Path<String>,
    Json(body): Json<StocksRequest>,
) -> Result<Json<StocksResponse>, ApiError> {
    let path = format!("/users/{id}/stocks/batch");
    let mut parsed = Vec::with_capacity(body.tickers.len());
    for raw in &body.tickers {
        parsed.push(
            TickerCode::parse(raw)
                .map_err(|e| ApiError::new(crate::domain::errors::FabricError::Invalid(e), path.clone()))?,
        );
    }
    state
        .user_store
        .set_user_stocks(&id, parsed)
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?;
    let tickers = state
        .user_store
        .get_user_stocks(&id)
        .await
        .map_err(|e| ApiError::new(e, path))?;
    Ok(Json(StocksResponse {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
    }))
}

async fn get_model(
    State(state): State<WorkerState>,
    Path(id): Path<String>,
) -> Result<Json<ModelResponse>, ApiError> {
    let llm_choice = state
        .user_store
        .get_model_choice(&id)
        .await
        .map_err(|e| ApiError::new(e, format!("/users/{id}/model")))?;
    Ok(Json(ModelResponse { llm_choice }))
}

async fn set_model(
    State(state): State<WorkerState>,
    Path(id): Path<String>,
    Json(body): Json<ModelRequest>,
) -> Result<Json<ModelResponse>, ApiError> {
    let path = format!("/users/{id}/model");
    let llm_choice = LlmKind::from_str(&body.llm_choice)
        .map_err(|e| ApiError::new(crate::domain::errors::FabricError::Invalid(e), path.clone()))?;
    state
        .user_store
        .set_model_choice(&id, llm_choice)
        .await
        .map_err(|e| ApiError::new(e, path))?;
    Ok(Json(ModelResponse { llm_choice }))
}

async fn get_config(
    State(state): State<WorkerState>,
    Path(id): Path<String>,
) -> Result<Json<UserConfigResponse>, ApiError> {
    let cfg = state
        .user_store
        .get_user_config(&id)
        .await
        .map_err(|e| ApiError::new(e, format!("/users/{id}/config")))?;
    Ok(Json(cfg.into()))
}

/// `get_wanted_services`/`set_wanted_services`: a per-user preference,
/// distinct from the gateway's fabric-wide
/// `ServiceDescriptor.enabled` admin toggle. Backed by the same
/// `UserConfig.enabled_services` field `update_profile` can also touch.
async fn get_wanted_services(
    State(state): State<WorkerState>,
    Path(id): Path<String>,
) -> Result<Json<WantedServicesResponse>, ApiError> {
    let cfg = state
        .user_store
        .get_user_config(&id)
        .await
        .map_err(|e| ApiError::new(e, format!("/users/{id}/wanted-services")))?;
    Ok(Json(WantedServicesResponse {
        enabled_services: cfg.enabled_services,
    }))
}

async fn set_wanted_services(
    State(state): State<WorkerState>,
    Path(id): Path<String>,
    Json(body): Json<WantedServicesRequest>,
) -> Result<Json<WantedServicesResponse>, ApiError> {
    let path = format!("/users/{id}/wanted-services");
    let mut wanted = HashSet::with_capacity(body.enabled_services.len());
    for raw in &body.enabled_services {
        let kind = crate::domain::service_kind::ServiceKind::from_str(raw).map_err(|_| {
            ApiError::new(
                crate::domain::errors::FabricError::Invalid(format!("unknown service: {raw}")),
                path.clone(),
            )
        })?;
        wanted.insert(kind);
    }
    state
        .user_store
        .update_user_config(
            &id,
            UserConfigPatch {
                enabled_services: Some(wanted),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?;
    let cfg = state
        .user_store
        .get_user_config(&id)
        .await
        .map_err(|e| ApiError::new(e, path))?;
    Ok(Json(WantedServicesResponse {
        enabled_services: cfg.enabled_services,
    }))
}
