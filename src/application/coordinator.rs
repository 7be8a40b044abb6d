//! L5 Coordinator (spec.md §4.6): a process-wide loop that pings each
//! enabled worker's `check-schedule` endpoint on a fixed cadence. The
//! coordinator makes no scheduling decisions of its own — workers decide
//! whether they are due; the coordinator only drives them. Started
//! explicitly from `gateway`'s `main` via `Coordinator::start`, never
//! spawned from a constructor (spec.md §9 Design Notes).

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::gateway::{FabricGateway, ForwardRequest};
use crate::domain::service_kind::ServiceKind;

pub struct Coordinator {
    gateway: Arc<FabricGateway>,
    tick_interval: Duration,
    tick_deadline: Duration,
}

impl Coordinator {
    pub fn new(gateway: Arc<FabricGateway>, tick_interval: Duration, tick_deadline: Duration) -> Self {
        Self {
            gateway,
            tick_interval,
            tick_deadline,
        }
    }

    /// Runs the tick loop until `shutdown` is cancelled. If the coordinator
    /// pauses (the loop is not driven, e.g. during a deploy), workers remain
    /// correct but simply do not run until the next tick (spec.md §4.6).
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Coordinator: shutdown requested, stopping tick loop");
                    return;
                }
                _ = ticker.tick() => {
                    self.tick_once().await;
                }
            }
        }
    }

    async fn tick_once(&self) {
        for kind in ServiceKind::ALL {
            let Some(descriptor) = self.gateway.descriptor(kind) else {
                continue;
            };
            if !descriptor.is_enabled() {
                continue;
            }

            let request = ForwardRequest {
                method: "POST".to_string(),
                path: format!("/api/{kind}/check-schedule"),
                query: Vec::new(),
                user_id: None,
                body: Vec::new(),
            };

            match tokio::time::timeout(self.tick_deadline, self.gateway.route(request)).await {
                Ok(Ok(response)) => {
                    debug!(service = %kind, status = response.status, "coordinator tick completed");
                }
                Ok(Err(err)) => {
                    // Non-fatal: logged and skipped until the next tick
                    // (spec.md §4.6).
                    warn!(service = %kind, error = %err, "coordinator tick failed");
                }
                Err(_) => {
                    warn!(service = %kind, deadline_ms = self.tick_deadline.as_millis(), "coordinator tick timed out");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::infrastructure::core::LocalCache;
    use crate::infrastructure::observability::Metrics;

    #[tokio::test]
    async fn tick_skips_disabled_services_without_error() {
        let cfg = GatewayConfig {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            services: ServiceKind::ALL
                .into_iter()
                .map(|k| (k, crate::config::ServiceEnvConfig::from_env(k)))
                .collect(),
            coordinator_tick_secs: 60,
            coordinator_tick_deadline_secs: 30,
            breaker_success_threshold: 1,
            distributed_cache_url: None,
        };
        let gateway = Arc::new(FabricGateway::new(
            &cfg,
            Arc::new(LocalCache::new()),
            Arc::new(Metrics::new().unwrap()),
        ));
        let coordinator = Coordinator::new(gateway, Duration::from_secs(60), Duration::from_secs(1));
        // No instances configured in the default test env, so every
        // descriptor defaults to disabled; the tick must be a no-op, not
        // a panic or hang.
        coordinator.tick_once().await;
    }
}
