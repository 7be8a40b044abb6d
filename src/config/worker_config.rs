//! Worker process configuration.

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::domain::service_kind::ServiceKind;
use crate::domain::user_config::TickerCode;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Which service this worker process embodies; selects its pipeline,
    /// scheduling cadence and routes.
    pub service: ServiceKind,
    pub bind_address: String,
    pub port: u16,
    /// Base URL of the gateway this worker's signals and health are
    /// reachable through.
    pub gateway_base_url: String,
    /// Worker-local HTTP client timeout for outbound adapter calls.
    pub adapter_timeout_ms: u32,
    /// Tickers the `flow` worker subscribes to. Ignored by every other
    /// service. There is no shared in-process state between workers, so this
    /// is the operator's static watchlist rather than a live union of user
    /// configs; see DESIGN.md.
    pub flow_tickers: Vec<TickerCode>,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        let service_str = env::var("WORKER_SERVICE").context("WORKER_SERVICE must be set")?;
        let service = ServiceKind::from_str(&service_str)
            .map_err(|_| anyhow::anyhow!("invalid WORKER_SERVICE: {service_str}"))?;

        let bind_address =
            env::var("WORKER_BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("WORKER_PORT")
            .unwrap_or_else(|_| "9090".to_string())
            .parse::<u16>()
            .context("WORKER_PORT must be a valid port number")?;

        let gateway_base_url =
            env::var("GATEWAY_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let adapter_timeout_ms = env::var("WORKER_ADAPTER_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10_000);

        let flow_tickers = env::var("WORKER_FLOW_TICKERS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .filter_map(|s| TickerCode::parse(s).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            service,
            bind_address,
            port,
            gateway_base_url,
            adapter_timeout_ms,
            flow_tickers,
        })
    }
}
