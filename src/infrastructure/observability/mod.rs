//! Observability for the fabric: structured logging via `tracing` plus a
//! pull-based Prometheus surface (`GET /metrics`, spec.md §6.1), in contrast
//! to the push-based stdout reporter this module replaces — the gateway and
//! each worker accept inbound HTTP, so there is no reason to push.

pub mod metrics;

pub use metrics::Metrics;
