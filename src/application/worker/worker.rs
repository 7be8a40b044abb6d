//! L3 Worker runtime (spec.md §4.2–§4.5): hosts one analysis domain. Owns
//! the scheduler decision, the user-rebind protocol, pipeline invocation,
//! per-user signal emission and notification fan-out.
//!
//! Per-request state (the "current user view") and per-domain state (the
//! last execution timestamp, the run-slot mutex) are fields on this struct
//! rather than module-level globals (spec.md §9 Design Notes) — the
//! `Fabric`-equivalent for a worker process constructs exactly one `Worker`
//! in `main` and threads it through the worker's axum handlers as `Arc<Worker>`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::errors::FabricError;
use crate::domain::ports::{AnalysisAdapter, NotificationAdapter, UserConfigStore};
use crate::domain::scheduler::{should_execute_now, ScheduleDecision};
use crate::domain::service_kind::ServiceKind;
use crate::domain::signal::Signal;
use crate::domain::user_config::UserConfig;
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::signal_store::SignalStore;

/// Header-absent fallback (spec.md §4.2 step 1, §6.1 `/execute`).
pub const SYSTEM_DEFAULT_USER: &str = "system";

/// Outcome of a `check-schedule` or `execute` invocation (spec.md §4.3,
/// §6.1 response shapes).
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineOutcome {
    pub executed: bool,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Per-ticker result of a pipeline run, used to build `details` (spec.md §7:
/// one ticker's failure must not abort the run).
#[derive(Debug, Clone, serde::Serialize)]
struct TickerRunResult {
    ticker: String,
    signals_emitted: usize,
    error: Option<String>,
}

pub struct Worker {
    pub kind: ServiceKind,
    last_execution_at: RwLock<Option<DateTime<Utc>>>,
    /// Serializes pipeline runs so overlapping `check-schedule` arrivals
    /// that both observe "due" only let one of them actually run (spec.md
    /// §4.3 concurrency note).
    run_lock: Mutex<()>,
    /// The worker's currently bound user view (spec.md §4.2 rebind
    /// protocol). `None` until the first rebind.
    current_user: RwLock<Option<UserConfig>>,
    user_store: Arc<dyn UserConfigStore>,
    analysis: Arc<dyn AnalysisAdapter>,
    notifications: Arc<dyn NotificationAdapter>,
    pub signals: Arc<SignalStore>,
    metrics: Arc<Metrics>,
}

impl Worker {
    pub fn new(
        kind: ServiceKind,
        user_store: Arc<dyn UserConfigStore>,
        analysis: Arc<dyn AnalysisAdapter>,
        notifications: Arc<dyn NotificationAdapter>,
        signals: Arc<SignalStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            kind,
            last_execution_at: RwLock::new(None),
            run_lock: Mutex::new(()),
            current_user: RwLock::new(None),
            user_store,
            analysis,
            notifications,
            signals,
            metrics,
        }
    }

    /// Rebind protocol (spec.md §4.2): swaps the worker's runtime view to
    /// `user_id`'s config if it isn't already bound there. The swap is
    /// atomic from a reader's perspective — in-flight work that already
    /// captured the prior snapshot (by cloning it, see `run_pipeline`)
    /// finishes under that snapshot, never a torn mix of old and new fields.
    pub async fn rebind(&self, user_id: Option<&str>) -> Result<UserConfig, FabricError> {
        let user_id = user_id.unwrap_or(SYSTEM_DEFAULT_USER);

        if let Some(cached) = self.current_user.read().clone() {
            if cached.user_id == user_id {
                return Ok(cached);
            }
        }

        let fresh = self.user_store.get_user_config(user_id).await?;
        *self.current_user.write() = Some(fresh.clone());
        debug!(worker = %self.kind, %user_id, "rebound worker to user config");
        Ok(fresh)
    }

    pub fn last_execution_at(&self) -> Option<DateTime<Utc>> {
        *self.last_execution_at.read()
    }

    /// Driven by the coordinator tick / `POST /check-schedule` (spec.md
    /// §4.3, §4.6): runs the pipeline only if `should_execute_now` agrees,
    /// re-checked under the run-slot lock to settle races between
    /// overlapping arrivals.
    pub async fn check_schedule(
        &self,
        now: DateTime<Utc>,
        user_id: Option<&str>,
    ) -> Result<PipelineOutcome, FabricError> {
        let _guard = self.run_lock.lock().await;

        let decision = should_execute_now(self.kind, now, self.last_execution_at());
        if !decision.should_run {
            self.metrics
                .inc_schedule_skip(&self.kind.to_string(), &decision.reason);
            return Ok(PipelineOutcome {
                executed: false,
                message: decision.reason,
                details: None,
            });
        }

        let outcome = self.run_locked(now, user_id, decision).await?;
        Ok(outcome)
    }

    /// Driven by `POST /execute` (spec.md §6.1): runs the pipeline
    /// unconditionally, ignoring the scheduler gate, but still serialized
    /// against a concurrent scheduler-driven run.
    pub async fn execute(&self, user_id: Option<&str>) -> Result<PipelineOutcome, FabricError> {
        let _guard = self.run_lock.lock().await;
        let now = Utc::now();
        self.run_locked(now, user_id, ScheduleDecision {
            should_run: true,
            reason: "explicit execute".to_string(),
        })
        .await
    }

    /// Must be called with `run_lock` held.
    async fn run_locked(
        &self,
        now: DateTime<Utc>,
        user_id: Option<&str>,
        decision: ScheduleDecision,
    ) -> Result<PipelineOutcome, FabricError> {
        let config = self.rebind(user_id).await?;
        let results = self.run_pipeline(&config).await;

        *self.last_execution_at.write() = Some(now);

        let total_signals: usize = results.iter().map(|r| r.signals_emitted).sum();
        let partial = results.iter().any(|r| r.error.is_some());

        Ok(PipelineOutcome {
            executed: true,
            message: decision.reason,
            details: Some(json!({
                "success": true,
                "partial": partial,
                "tickers": results,
                "signals_emitted": total_signals,
            })),
        })
    }

    /// Runs the analysis adapter once per watched ticker (spec.md §7:
    /// per-ticker isolation — one ticker's `AdapterFailure` must not abort
    /// the run). Successful emissions are saved to the signal store first,
    /// then sent over the notification channel (spec.md §9 recommendation:
    /// on send failure the saved signal remains discoverable via `/signal`).
    async fn run_pipeline(&self, config: &UserConfig) -> Vec<TickerRunResult> {
        let mut results = Vec::with_capacity(config.watched_tickers.len());

        for ticker in &config.watched_tickers {
            match self.analysis.run_for_ticker(ticker, config).await {
                Ok(signals) => {
                    for signal in &signals {
                        self.emit(config, signal.clone()).await;
                    }
                    results.push(TickerRunResult {
                        ticker: ticker.to_string(),
                        signals_emitted: signals.len(),
                        error: None,
                    });
                }
                Err(err) => {
                    warn!(
                        worker = %self.kind,
                        %ticker,
                        error = %err,
                        "ticker analysis failed; continuing with remaining tickers"
                    );
                    results.push(TickerRunResult {
                        ticker: ticker.to_string(),
                        signals_emitted: 0,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        results
    }

    /// Saves a freshly emitted signal, then attempts the notification
    /// fan-out (spec.md §9: save first, send second).
    async fn emit(&self, config: &UserConfig, signal: Signal) {
        self.signals.append(&config.user_id, self.kind, signal.clone());
        self.metrics.inc_execution(&self.kind.to_string(), signal.stock_code.as_str());
        self.metrics.inc_signal_emitted(&self.kind.to_string());

        if !config.notify.enabled_for(self.kind) {
            return;
        }
        let Some(chat_id) = config.notify.chat_id.as_deref() else {
            return;
        };
        if let Err(err) = self.notifications.send_text(chat_id, &signal.message).await {
            warn!(
                worker = %self.kind,
                chat_id,
                error = %err,
                "notification send failed; signal remains saved and pullable"
            );
        } else {
            info!(worker = %self.kind, chat_id, "signal notification sent");
        }
    }

    /// `GET /signal` (spec.md §6.1): the latest signal for the currently
    /// bound user, or `None` if nothing has been emitted yet.
    pub fn latest_signal(&self, user_id: &str) -> Option<Signal> {
        self.signals.latest_or_none(user_id, self.kind)
    }

    pub fn recent_signals(&self, user_id: &str) -> Vec<Signal> {
        self.signals.list_recent(user_id, self.kind, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user_config::TickerCode;
    use crate::infrastructure::adapters::{MockAnalysisAdapter, MockNotificationAdapter};
    use crate::infrastructure::user_config_store::InMemoryUserConfigStore;
    use std::collections::HashSet;

    fn test_worker(kind: ServiceKind) -> (Worker, Arc<InMemoryUserConfigStore>) {
        let store = Arc::new(InMemoryUserConfigStore::new());
        let worker = Worker::new(
            kind,
            store.clone(),
            Arc::new(MockAnalysisAdapter::new(kind)),
            Arc::new(MockNotificationAdapter::new()),
            Arc::new(SignalStore::new()),
            Arc::new(Metrics::new().unwrap()),
        );
        (worker, store)
    }

    #[tokio::test]
    async fn rebind_calls_store_once_per_distinct_user() {
        let (worker, store) = test_worker(ServiceKind::Chart);
        store.register_profile("42", None).await.unwrap();

        let first = worker.rebind(Some("42")).await.unwrap();
        assert_eq!(first.user_id, "42");

        // Rebinding to the same user again must not require a fresh store
        // hit to observe correctness; the cached view already matches.
        let second = worker.rebind(Some("42")).await.unwrap();
        assert_eq!(second.user_id, "42");
    }

    #[tokio::test]
    async fn rebind_defaults_to_system_user_when_header_absent() {
        let (worker, _store) = test_worker(ServiceKind::Chart);
        let cfg = worker.rebind(None).await.unwrap();
        assert_eq!(cfg.user_id, SYSTEM_DEFAULT_USER);
    }

    #[tokio::test]
    async fn check_schedule_runs_on_first_call_and_updates_last_execution() {
        let (worker, _store) = test_worker(ServiceKind::Chart);
        assert!(worker.last_execution_at().is_none());

        let outcome = worker.check_schedule(Utc::now(), None).await.unwrap();
        assert!(outcome.executed);
        assert!(worker.last_execution_at().is_some());
    }

    #[tokio::test]
    async fn check_schedule_gates_second_call_within_interval() {
        let (worker, _store) = test_worker(ServiceKind::Chart);
        let now = Utc::now();
        worker.check_schedule(now, None).await.unwrap();

        let outcome = worker
            .check_schedule(now + chrono::Duration::minutes(1), None)
            .await
            .unwrap();
        assert!(!outcome.executed);
    }

    #[tokio::test]
    async fn execute_runs_regardless_of_schedule_gate() {
        let (worker, _store) = test_worker(ServiceKind::Chart);
        let now = Utc::now();
        worker.check_schedule(now, None).await.unwrap();

        // Scheduler would gate a second check-schedule within the interval,
        // but an explicit execute must still run (spec.md §6.1 /execute).
        let outcome = worker.execute(None).await.unwrap();
        assert!(outcome.executed);
    }

    #[tokio::test]
    async fn pipeline_isolates_per_ticker_failures() {
        let (worker, store) = test_worker(ServiceKind::News);
        let tickers: HashSet<TickerCode> = [TickerCode::parse("005930").unwrap()]
            .into_iter()
            .collect();
        store
            .update_user_config(
                SYSTEM_DEFAULT_USER,
                crate::domain::user_config::UserConfigPatch {
                    watched_tickers: Some(tickers),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = worker.execute(None).await.unwrap();
        assert!(outcome.executed);
        let details = outcome.details.unwrap();
        assert!(details["tickers"].as_array().unwrap().len() == 1);
    }

    #[tokio::test]
    async fn latest_signal_reflects_most_recent_emission() {
        let (worker, store) = test_worker(ServiceKind::Chart);
        let tickers: HashSet<TickerCode> = [TickerCode::parse("005930").unwrap()]
            .into_iter()
            .collect();
        store
            .update_user_config(
                SYSTEM_DEFAULT_USER,
                crate::domain::user_config::UserConfigPatch {
                    watched_tickers: Some(tickers),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        worker.execute(None).await.unwrap();
        assert!(worker.latest_signal(SYSTEM_DEFAULT_USER).is_some());
    }

    #[tokio::test]
    async fn overlapping_check_schedule_calls_serialize_to_a_single_run() {
        let (worker, _store) = test_worker(ServiceKind::Chart);
        let worker = Arc::new(worker);
        let now = Utc::now();

        let w1 = worker.clone();
        let w2 = worker.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move { w1.check_schedule(now, None).await.unwrap() }),
            tokio::spawn(async move { w2.check_schedule(now, None).await.unwrap() }),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        // Exactly one of the two concurrent arrivals observes "due"; the
        // other, serialized behind the run-slot lock, re-checks and finds
        // `last_execution_at` already advanced.
        assert_ne!(a.executed, b.executed);
    }
}
