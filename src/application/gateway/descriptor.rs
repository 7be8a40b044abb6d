//! `ServiceDescriptor` (spec.md §3): the gateway's view of one backend
//! service — its instance pool, breaker and health state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::ServiceEnvConfig;
use crate::domain::service_kind::ServiceKind;
use crate::infrastructure::core::CircuitBreaker;

/// Health classification from the background prober (spec.md §4.1.4).
/// Updated only by `HealthMonitor`; never written from the forwarding path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

pub struct ServiceDescriptor {
    pub kind: ServiceKind,
    pub instances: Vec<String>,
    enabled: AtomicBool,
    pub timeout: Duration,
    pub retry_budget: u8,
    pub breaker: Arc<CircuitBreaker>,
    health: RwLock<HealthState>,
}

impl ServiceDescriptor {
    pub fn from_env_config(cfg: ServiceEnvConfig, breaker_success_threshold: usize) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(
            cfg.kind.to_string(),
            cfg.fail_max,
            breaker_success_threshold,
            cfg.reset_timeout,
        ));
        Self {
            kind: cfg.kind,
            instances: cfg.instances,
            enabled: AtomicBool::new(cfg.enabled),
            timeout: Duration::from_millis(cfg.timeout_ms as u64),
            retry_budget: cfg.retry_budget,
            breaker,
            health: RwLock::new(HealthState::Unknown),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Flips `enabled`, returning the new value (spec.md §4.1.1 `toggleService`).
    pub fn toggle(&self) -> bool {
        let current = self.enabled.load(Ordering::Relaxed);
        self.enabled.store(!current, Ordering::Relaxed);
        !current
    }

    pub fn health(&self) -> HealthState {
        *self.health.read()
    }

    pub fn set_health(&self, state: HealthState) {
        *self.health.write() = state;
    }

    /// Candidate instances for routing: all instances when `Healthy` or
    /// `Degraded`/`Unknown` (best effort); none when `Unhealthy` — spec.md
    /// §4.1.2 step 4 requires a non-empty `healthy_or_degraded` subset.
    ///
    /// This crate has no per-instance health granularity (the prober
    /// classifies the whole descriptor), so the subset degrades to "all
    /// instances" unless the descriptor as a whole is `Unhealthy`.
    pub fn healthy_or_degraded(&self) -> &[String] {
        if self.health() == HealthState::Unhealthy {
            &[]
        } else {
            &self.instances
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ServiceDescriptor {
        ServiceDescriptor::from_env_config(
            ServiceEnvConfig {
                kind: ServiceKind::Chart,
                instances: vec!["http://a".to_string()],
                enabled: true,
                timeout_ms: 1000,
                retry_budget: 0,
                fail_max: 3,
                reset_timeout: Duration::from_secs(30),
            },
            1,
        )
    }

    #[test]
    fn toggle_flips_and_returns_new_state() {
        let d = descriptor();
        assert!(d.is_enabled());
        assert!(!d.toggle());
        assert!(!d.is_enabled());
        assert!(d.toggle());
        assert!(d.is_enabled());
    }

    #[test]
    fn unhealthy_descriptor_has_no_candidates() {
        let d = descriptor();
        d.set_health(HealthState::Unhealthy);
        assert!(d.healthy_or_degraded().is_empty());
    }

    #[test]
    fn healthy_descriptor_exposes_all_instances() {
        let d = descriptor();
        d.set_health(HealthState::Healthy);
        assert_eq!(d.healthy_or_degraded().len(), 1);
    }
}
