//! Gateway process configuration (spec.md §4.1, §4.6, §6.3).

use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result};

use crate::config::service_config::ServiceEnvConfig;
use crate::domain::service_kind::ServiceKind;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_address: String,
    pub port: u16,
    pub services: HashMap<ServiceKind, ServiceEnvConfig>,
    /// Coordinator tick cadence (spec.md §4.6, default 60s).
    pub coordinator_tick_secs: u64,
    /// Bounded per-tick deadline (spec.md §4.6, default 30s).
    pub coordinator_tick_deadline_secs: u64,
    /// `CircuitBreaker::success_threshold` for every service breaker:
    /// spec.md §3 describes HalfOpen "admits a single probe" with no
    /// further qualification, so one success closes the circuit.
    pub breaker_success_threshold: usize,
    /// Preferred distributed cache backend URL (spec.md §4.1.3). Unset
    /// falls back to the in-process `LocalCache`; no distributed backend
    /// ships in this crate (see DESIGN.md).
    pub distributed_cache_url: Option<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let bind_address =
            env::var("GATEWAY_BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("GATEWAY_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("GATEWAY_PORT must be a valid port number")?;

        let services = ServiceKind::ALL
            .into_iter()
            .map(|kind| (kind, ServiceEnvConfig::from_env(kind)))
            .collect();

        let coordinator_tick_secs = env::var("COORDINATOR_TICK_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let coordinator_tick_deadline_secs = env::var("COORDINATOR_TICK_DEADLINE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let breaker_success_threshold = env::var("GATEWAY_BREAKER_SUCCESS_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1);

        let distributed_cache_url = env::var("DISTRIBUTED_CACHE_URL").ok();

        Ok(Self {
            bind_address,
            port,
            services,
            coordinator_tick_secs,
            coordinator_tick_deadline_secs,
            breaker_success_threshold,
            distributed_cache_url,
        })
    }
}
