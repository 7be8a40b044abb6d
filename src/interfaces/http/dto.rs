//! Explicit request/response DTOs: every shape crossing the HTTP boundary is
//! a named, `serde`-derived struct, never a raw `serde_json::Value` threaded
//! through business logic.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::FabricError;
use crate::domain::service_kind::ServiceKind;
use crate::domain::user_config::{LlmKind, Thresholds, UserConfig};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub path: String,
}

impl ErrorBody {
    pub fn from_error(err: &FabricError, path: &str) -> Self {
        Self {
            error: ErrorDetail {
                code: err.code(),
                message: err.to_string(),
                timestamp: Utc::now(),
                path: path.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckScheduleResponse {
    pub executed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UserHeaderQuery {
    /// Accepted as a query fallback in addition to the `X-User-ID` header,
    /// for clients that cannot set custom headers.
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignalResponse {
    #[serde(flatten)]
    pub signal: Option<crate::domain::signal::Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl SignalResponse {
    pub fn none() -> Self {
        Self {
            signal: None,
            message: Some("none"),
        }
    }

    pub fn found(signal: crate::domain::signal::Signal) -> Self {
        Self {
            signal: Some(signal),
            message: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceStatusEntry {
    pub phase: crate::domain::market_phase::MarketPhase,
    pub healthy_instances: usize,
    pub breaker_state: String,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ServicesStatusResponse {
    pub services: HashMap<String, ServiceStatusEntry>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub service: String,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Serialize)]
pub struct CircuitBreakerStatusEntry {
    pub service: String,
    pub state: String,
}

#[derive(Debug, Serialize)]
pub struct CircuitBreakerStatusResponse {
    pub breakers: Vec<CircuitBreakerStatusEntry>,
}

#[derive(Debug, Serialize)]
pub struct FabricSummaryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub services: HashMap<String, ServiceStatusEntry>,
}

// --- User-configuration routes (proxied to the `user` worker) ---

#[derive(Debug, Deserialize)]
pub struct RegisterProfileRequest {
    pub user_id: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserConfigResponse {
    pub user_id: String,
    pub watched_tickers: Vec<String>,
    pub thresholds: Thresholds,
    pub llm_choice: LlmKind,
    pub enabled_services: HashSet<ServiceKind>,
    pub notify_chat_id: Option<String>,
}

impl From<UserConfig> for UserConfigResponse {
    fn from(cfg: UserConfig) -> Self {
        let mut watched_tickers: Vec<String> =
            cfg.watched_tickers.iter().map(|t| t.to_string()).collect();
        watched_tickers.sort();
        Self {
            user_id: cfg.user_id,
            watched_tickers,
            thresholds: cfg.thresholds,
            llm_choice: cfg.llm_choice,
            enabled_services: cfg.enabled_services,
            notify_chat_id: cfg.notify.chat_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StocksRequest {
    pub tickers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StocksResponse {
    pub tickers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModelRequest {
    pub llm_choice: String,
}

#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub llm_choice: LlmKind,
}

#[derive(Debug, Deserialize)]
pub struct WantedServicesRequest {
    pub enabled_services: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct WantedServicesResponse {
    pub enabled_services: HashSet<ServiceKind>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileRequest {
    pub thresholds: Option<Thresholds>,
    pub llm_choice: Option<String>,
    pub notify_chat_id: Option<String>,
}
