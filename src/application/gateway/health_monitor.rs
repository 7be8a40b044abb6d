//! Background prober (spec.md §4.1.4): every 30s, GETs `/health` on each
//! enabled service's instances and classifies the descriptor as `Healthy`
//! (all replied), `Degraded` (some replied) or `Unhealthy` (none replied).
//! Independent of the circuit breaker — health never short-circuits it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::gateway::descriptor::HealthState;
use crate::application::gateway::fabric_gateway::FabricGateway;

const PROBE_INTERVAL: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub struct HealthMonitor {
    gateway: Arc<FabricGateway>,
    client: Client,
}

impl HealthMonitor {
    pub fn new(gateway: Arc<FabricGateway>) -> Self {
        Self {
            gateway,
            client: Client::builder()
                .timeout(PROBE_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Runs the probe loop until `shutdown` is cancelled. Never spawned
    /// from a constructor — started explicitly by `Fabric::start`.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(PROBE_INTERVAL);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("HealthMonitor: shutdown requested, stopping probe loop");
                    return;
                }
                _ = ticker.tick() => {
                    self.probe_once().await;
                }
            }
        }
    }

    async fn probe_once(&self) {
        for descriptor in self.gateway.descriptors_iter() {
            if !descriptor.is_enabled() {
                continue;
            }
            if descriptor.instances.is_empty() {
                descriptor.set_health(HealthState::Unknown);
                continue;
            }

            let mut replied = 0usize;
            for instance in &descriptor.instances {
                let url = format!("{instance}/health");
                match self.client.get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => replied += 1,
                    Ok(resp) => {
                        warn!("HealthMonitor: {url} returned {}", resp.status());
                    }
                    Err(e) => {
                        warn!("HealthMonitor: {url} unreachable: {e}");
                    }
                }
            }

            let state = if replied == descriptor.instances.len() {
                HealthState::Healthy
            } else if replied > 0 {
                HealthState::Degraded
            } else {
                HealthState::Unhealthy
            };
            descriptor.set_health(state);
        }
    }
}
