//! Flow worker websocket lifecycle (spec.md §4.4): a specialization of the
//! L3 scheduler slice for the one worker domain that also owns a live
//! streaming subscription. The state machine itself is pure (like
//! `domain::scheduler`) so its transitions can be tested without a real
//! transport; `FlowLifecycleDriver` is the thin I/O shell around it.

use std::time::Duration;

use crate::domain::market_phase::MarketPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Off,
    Subscribing,
    Subscribed,
    Reconnecting,
}

/// Base delay for the Flow worker's reconnect backoff (spec.md §4.4:
/// `delay = min(base * 2^attempt, 300s)`).
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(300);

/// Approval tokens are renewed once their remaining lifetime drops below
/// this threshold (spec.md §4.4).
pub const TOKEN_RENEWAL_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Transition events the driver feeds into the pure state machine.
#[derive(Debug, Clone, Copy)]
pub enum FlowEvent {
    PhaseChanged(MarketPhase),
    SubscriptionAcked,
    TransportDisconnected,
}

#[derive(Debug, Clone)]
pub struct FlowLifecycle {
    state: FlowState,
    /// Reconnect attempts since the last successful subscription; reset on
    /// `SubscriptionAcked`.
    attempt: u32,
}

impl Default for FlowLifecycle {
    fn default() -> Self {
        Self {
            state: FlowState::Off,
            attempt: 0,
        }
    }
}

impl FlowLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Applies one event and returns the action the driver must now take.
    pub fn apply(&mut self, event: FlowEvent) -> FlowAction {
        match event {
            FlowEvent::PhaseChanged(MarketPhase::MarketHours) => {
                if self.state == FlowState::Off {
                    self.state = FlowState::Subscribing;
                    FlowAction::Subscribe
                } else {
                    FlowAction::None
                }
            }
            FlowEvent::PhaseChanged(_non_market) => {
                if matches!(
                    self.state,
                    FlowState::Subscribing | FlowState::Subscribed | FlowState::Reconnecting
                ) {
                    self.state = FlowState::Off;
                    self.attempt = 0;
                    FlowAction::Teardown
                } else {
                    FlowAction::None
                }
            }
            FlowEvent::SubscriptionAcked => {
                self.state = FlowState::Subscribed;
                self.attempt = 0;
                FlowAction::None
            }
            FlowEvent::TransportDisconnected => {
                if self.state == FlowState::Off {
                    // A stale disconnect arriving after teardown; ignore.
                    return FlowAction::None;
                }
                self.state = FlowState::Reconnecting;
                let delay = backoff_delay(self.attempt);
                self.attempt += 1;
                FlowAction::ReconnectAfter(delay)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    None,
    Subscribe,
    Teardown,
    ReconnectAfter(Duration),
}

fn backoff_delay(attempt: u32) -> Duration {
    let scaled = BACKOFF_BASE.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    scaled.min(BACKOFF_CAP)
}

/// Whether a token with `remaining` lifetime should be renewed before the
/// next subscribe call (spec.md §4.4).
pub fn needs_renewal(remaining: Duration) -> bool {
    remaining < TOKEN_RENEWAL_THRESHOLD
}
