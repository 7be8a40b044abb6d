//! `FlowLifecycleDriver`: the I/O shell around `FlowLifecycle` (spec.md
//! §4.4). Polls the market phase every tick, feeds `PhaseChanged` into the
//! pure state machine, and opens/closes the data-source subscription per
//! the action it gets back. Runs as its own background task started from
//! `worker`'s `main`, never spawned from a constructor.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc::Receiver, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::worker::flow_lifecycle::{needs_renewal, FlowAction, FlowEvent, FlowLifecycle};
use crate::application::worker::flow_ring::FlowRing;
use crate::domain::market_phase::{phase_at, MarketPhase};
use crate::domain::ports::DataSourceAdapter;
use crate::domain::user_config::TickerCode;

const PHASE_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

pub struct FlowLifecycleDriver {
    data_source: Arc<dyn DataSourceAdapter>,
    ring: Arc<FlowRing>,
    tickers: Vec<TickerCode>,
    lifecycle: Mutex<FlowLifecycle>,
    last_phase: Mutex<Option<MarketPhase>>,
}

impl FlowLifecycleDriver {
    pub fn new(data_source: Arc<dyn DataSourceAdapter>, ring: Arc<FlowRing>, tickers: Vec<TickerCode>) -> Self {
        Self {
            data_source,
            ring,
            tickers,
            lifecycle: Mutex::new(FlowLifecycle::new()),
            last_phase: Mutex::new(None),
        }
    }

    /// Runs until `shutdown` is cancelled. Never spawned from `new` (spec.md
    /// §9 Design Notes) — call `tokio::spawn(driver.run(ctx))` explicitly.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(PHASE_POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("FlowLifecycleDriver: shutdown requested, stopping");
                    return;
                }
                _ = ticker.tick() => {
                    Self::poll_phase(&self).await;
                }
            }
        }
    }

    async fn poll_phase(self: &Arc<Self>) {
        let phase = phase_at(chrono::Utc::now());
        let mut last_phase = self.last_phase.lock().await;
        if *last_phase == Some(phase) {
            return;
        }
        *last_phase = Some(phase);
        drop(last_phase);

        let action = self.lifecycle.lock().await.apply(FlowEvent::PhaseChanged(phase));
        self.handle_action(action).await;
    }

    async fn handle_action(self: &Arc<Self>, action: FlowAction) {
        match action {
            FlowAction::None => {}
            FlowAction::Subscribe => self.subscribe_all().await,
            FlowAction::Teardown => self.teardown_all().await,
            FlowAction::ReconnectAfter(delay) => {
                debug!(delay_secs = delay.as_secs(), "Flow: reconnecting after backoff");
                tokio::time::sleep(delay).await;
                self.subscribe_all().await;
            }
        }
    }

    async fn subscribe_all(self: &Arc<Self>) {
        if needs_renewal(self.data_source.token_remaining_life()) {
            info!("Flow: approval token nearing expiry, renewal expected before subscribe");
        }

        let mut receivers: HashMap<TickerCode, Receiver<_>> = HashMap::new();
        for ticker in &self.tickers {
            match self.data_source.subscribe(ticker).await {
                Ok(rx) => {
                    receivers.insert(ticker.clone(), rx);
                }
                Err(err) => {
                    warn!(%ticker, error = %err, "Flow: subscribe failed");
                    let delay = match self.lifecycle.lock().await.apply(FlowEvent::TransportDisconnected) {
                        FlowAction::ReconnectAfter(d) => d,
                        _ => return,
                    };
                    let driver = self.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        driver.subscribe_all().await;
                    });
                    return;
                }
            }
        }

        let ack = self.lifecycle.lock().await.apply(FlowEvent::SubscriptionAcked);
        debug_assert!(matches!(ack, FlowAction::None));

        let ring = self.ring.clone();
        for (ticker, mut rx) in receivers {
            let ring = ring.clone();
            tokio::spawn(async move {
                while let Some(message) = rx.recv().await {
                    ring.push(message);
                }
                debug!(%ticker, "Flow: subscription channel closed");
            });
        }
    }

    async fn teardown_all(&self) {
        for ticker in &self.tickers {
            if let Err(err) = self.data_source.unsubscribe(ticker).await {
                warn!(%ticker, error = %err, "Flow: unsubscribe failed during teardown");
            }
        }
        self.ring.clear();
    }
}
