//! Prometheus metrics definitions for the fabric.
//!
//! All metrics use the `fabric_` prefix and are read-only outside of this
//! module. Gateway and worker processes each hold their own `Metrics`
//! instance; the `GET /metrics` route (spec.md §6.1) renders it.

use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics shared by the gateway and worker binaries.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Inbound HTTP requests by method, service, path and status.
    pub requests_total: CounterVec,
    /// Inbound HTTP request duration in seconds.
    pub duration_seconds: HistogramVec,
    /// Backend (service instance) response latency, as observed by the
    /// gateway's forwarding path.
    pub backend_response_seconds: HistogramVec,
    /// Response cache hits by service.
    pub cache_hits_total: CounterVec,
    /// Response cache misses by service.
    pub cache_misses_total: CounterVec,
    /// Circuit breaker state per service (0=closed, 1=half_open, 2=open).
    pub circuit_breaker_state: GaugeVec,
    /// Scheduler executions actually dispatched, by service and ticker.
    pub executions_total: CounterVec,
    /// Scheduler gate decisions that were skipped, by service and reason.
    pub schedule_skips_total: CounterVec,
    /// Signals appended to the per-user signal store, by service.
    pub signals_emitted_total: CounterVec,
}

impl Metrics {
    /// Create a new `Metrics` instance with all series registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new(
                "fabric_requests_total",
                "Total inbound HTTP requests by method, service, path and status",
            ),
            &["method", "service", "path", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "fabric_duration_seconds",
                "Inbound HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(duration_seconds.clone()))?;

        let backend_response_seconds = HistogramVec::new(
            HistogramOpts::new(
                "fabric_backend_response_seconds",
                "Backend service instance response latency as observed by the gateway",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["service"],
        )?;
        registry.register(Box::new(backend_response_seconds.clone()))?;

        let cache_hits_total = CounterVec::new(
            Opts::new("fabric_cache_hits_total", "Response cache hits by service"),
            &["service"],
        )?;
        registry.register(Box::new(cache_hits_total.clone()))?;

        let cache_misses_total = CounterVec::new(
            Opts::new(
                "fabric_cache_misses_total",
                "Response cache misses by service",
            ),
            &["service"],
        )?;
        registry.register(Box::new(cache_misses_total.clone()))?;

        let circuit_breaker_state = GaugeVec::new(
            Opts::new(
                "fabric_circuit_breaker_state",
                "Circuit breaker state per service (0=closed, 1=half_open, 2=open)",
            ),
            &["service"],
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        let executions_total = CounterVec::new(
            Opts::new(
                "fabric_executions_total",
                "Scheduler executions dispatched by service and ticker",
            ),
            &["service", "ticker"],
        )?;
        registry.register(Box::new(executions_total.clone()))?;

        let schedule_skips_total = CounterVec::new(
            Opts::new(
                "fabric_schedule_skips_total",
                "Scheduler gate decisions skipped, by service and reason",
            ),
            &["service", "reason"],
        )?;
        registry.register(Box::new(schedule_skips_total.clone()))?;

        let signals_emitted_total = CounterVec::new(
            Opts::new(
                "fabric_signals_emitted_total",
                "Signals appended to the per-user signal store, by service",
            ),
            &["service"],
        )?;
        registry.register(Box::new(signals_emitted_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            duration_seconds,
            backend_response_seconds,
            cache_hits_total,
            cache_misses_total,
            circuit_breaker_state,
            executions_total,
            schedule_skips_total,
            signals_emitted_total,
        })
    }

    /// Render all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn record_request(&self, method: &str, service: &str, path: &str, status: u16) {
        self.requests_total
            .with_label_values(&[method, service, path, &status.to_string()])
            .inc();
    }

    pub fn observe_duration(&self, method: &str, path: &str, seconds: f64) {
        self.duration_seconds
            .with_label_values(&[method, path])
            .observe(seconds);
    }

    pub fn observe_backend_response(&self, service: &str, seconds: f64) {
        self.backend_response_seconds
            .with_label_values(&[service])
            .observe(seconds);
    }

    pub fn inc_cache_hit(&self, service: &str) {
        self.cache_hits_total.with_label_values(&[service]).inc();
    }

    pub fn inc_cache_miss(&self, service: &str) {
        self.cache_misses_total.with_label_values(&[service]).inc();
    }

    /// Set circuit breaker state. Expects `state` as the numeric encoding
    /// used by `fabric_circuit_breaker_state` (0=closed, 1=half_open, 2=open).
    pub fn set_breaker_state(&self, service: &str, state: f64) {
        self.circuit_breaker_state
            .with_label_values(&[service])
            .set(state);
    }

    pub fn inc_execution(&self, service: &str, ticker: &str) {
        self.executions_total
            .with_label_values(&[service, ticker])
            .inc();
    }

    pub fn inc_schedule_skip(&self, service: &str, reason: &str) {
        self.schedule_skips_total
            .with_label_values(&[service, reason])
            .inc();
    }

    pub fn inc_signal_emitted(&self, service: &str) {
        self.signals_emitted_total
            .with_label_values(&[service])
            .inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("failed to create default Metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_render_includes_prefix() {
        let metrics = Metrics::new().expect("failed to create metrics");
        assert!(metrics.render().contains("fabric_"));
    }

    #[test]
    fn request_counter_labels_round_trip() {
        let metrics = Metrics::new().expect("failed to create metrics");
        metrics.record_request("GET", "chart", "/api/chart/health", 200);
        let output = metrics.render();
        assert!(output.contains("fabric_requests_total"));
        assert!(output.contains("chart"));
    }

    #[test]
    fn breaker_state_gauge_updates() {
        let metrics = Metrics::new().expect("failed to create metrics");
        metrics.set_breaker_state("news", 2.0);
        let output = metrics.render();
        assert!(output.contains("fabric_circuit_breaker_state"));
        assert!(output.contains("news"));
    }

    #[test]
    fn cache_hit_and_miss_counters() {
        let metrics = Metrics::new().expect("failed to create metrics");
        metrics.inc_cache_hit("disclosure");
        metrics.inc_cache_miss("disclosure");
        let output = metrics.render();
        assert!(output.contains("fabric_cache_hits_total"));
        assert!(output.contains("fabric_cache_misses_total"));
    }
}
