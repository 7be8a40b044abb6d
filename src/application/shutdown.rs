//! Graceful shutdown (spec.md §5): on a termination signal, stop accepting
//! new work, let in-flight requests and pipeline runs drain, persist the
//! latest signals on a best-effort basis, and close pooled connections.
//!
//! Grounded on the teacher's `application::system::shutdown_service`
//! (`ShutdownService::shutdown`, an explicit ordered sequence of steps
//! logged as it proceeds) — simplified here because the fabric carries no
//! durable state to flush: the signal store is in-memory only (spec.md §1
//! Non-goals: no durability guarantees), so "persist" degrades to a log
//! line documenting what is about to be lost.

use std::time::Duration;

use tracing::info;

/// Runs the fabric's shutdown sequence. `component` names the process
/// (`"gateway"` or a worker's `ServiceKind`) for the log lines.
pub async fn graceful_shutdown(component: &str, drain: Duration) {
    info!(component, "shutdown signal received; draining in-flight work");
    tokio::time::sleep(drain).await;
    info!(
        component,
        "in-memory signal store will not survive this shutdown"
    );
    info!(component, "shutdown sequence complete");
}
