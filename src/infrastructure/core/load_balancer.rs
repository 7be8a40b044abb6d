//! Round-robin instance selection for the gateway (spec.md §4.1.2 step 5).

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::service_kind::ServiceKind;

/// Per-service monotonic counter modulo the candidate list length. Ties
/// break deterministically since the counter only ever increases.
#[derive(Default)]
pub struct LoadBalancer {
    counters: DashMap<ServiceKind, AtomicUsize>,
}

impl LoadBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the next instance URL for `kind` out of `candidates`.
    /// Panics only if `candidates` is empty — callers must check
    /// `healthy_or_degraded` non-emptiness first (spec.md §4.1.2 step 4).
    pub fn next<'a>(&self, kind: ServiceKind, candidates: &'a [String]) -> &'a str {
        assert!(!candidates.is_empty(), "load balancer requires >=1 candidate");

        let counter = self
            .counters
            .entry(kind)
            .or_insert_with(|| AtomicUsize::new(0));
        let index = counter.fetch_add(1, Ordering::Relaxed) % candidates.len();
        &candidates[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_visits_every_instance_evenly() {
        let lb = LoadBalancer::new();
        let instances = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let mut counts = std::collections::HashMap::new();
        for _ in 0..300 {
            let chosen = lb.next(ServiceKind::Chart, &instances);
            *counts.entry(chosen.to_string()).or_insert(0) += 1;
        }

        assert_eq!(counts.get("a"), Some(&100));
        assert_eq!(counts.get("b"), Some(&100));
        assert_eq!(counts.get("c"), Some(&100));
    }

    #[test]
    fn different_services_have_independent_counters() {
        let lb = LoadBalancer::new();
        let instances = vec!["x".to_string(), "y".to_string()];

        assert_eq!(lb.next(ServiceKind::News, &instances), "x");
        assert_eq!(lb.next(ServiceKind::Chart, &instances), "x");
        assert_eq!(lb.next(ServiceKind::News, &instances), "y");
    }
}
