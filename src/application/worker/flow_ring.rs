//! Bounded per-ticker ring for live subscription messages (spec.md §4.4):
//! capacity 100, feeding the composite-trigger evaluator (an external
//! analysis concern — this module only owns the bounded buffer).

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::ports::StreamMessage;
use crate::domain::user_config::TickerCode;

const RING_CAPACITY: usize = 100;

#[derive(Default)]
pub struct FlowRing {
    rings: RwLock<HashMap<TickerCode, Vec<StreamMessage>>>,
}

impl FlowRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: StreamMessage) {
        let mut rings = self.rings.write();
        let ring = rings.entry(message.ticker.clone()).or_default();
        if ring.len() == RING_CAPACITY {
            ring.remove(0);
        }
        ring.push(message);
    }

    pub fn snapshot(&self, ticker: &TickerCode) -> Vec<StreamMessage> {
        self.rings
            .read()
            .get(ticker)
            .cloned()
            .unwrap_or_default()
    }

    /// Drops every ticker's buffer, e.g. on a clean teardown back to `Off`
    /// (spec.md §4.4) so a later resubscribe starts from an empty ring.
    pub fn clear(&self) {
        self.rings.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn message(ticker: &str, seq: i64) -> StreamMessage {
        StreamMessage {
            ticker: TickerCode::parse(ticker).unwrap(),
            received_at: Utc::now(),
            payload: json!({ "seq": seq }),
        }
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let ring = FlowRing::new();
        let ticker = TickerCode::parse("005930").unwrap();
        for i in 0..(RING_CAPACITY as i64 + 5) {
            ring.push(message("005930", i));
        }
        let snapshot = ring.snapshot(&ticker);
        assert_eq!(snapshot.len(), RING_CAPACITY);
        assert_eq!(snapshot.first().unwrap().payload["seq"], 5);
    }

    #[test]
    fn tickers_are_isolated() {
        let ring = FlowRing::new();
        ring.push(message("005930", 1));
        ring.push(message("000660", 2));
        assert_eq!(ring.snapshot(&TickerCode::parse("005930").unwrap()).len(), 1);
        assert_eq!(ring.snapshot(&TickerCode::parse("000660").unwrap()).len(), 1);
    }

    #[test]
    fn clear_drops_every_ticker() {
        let ring = FlowRing::new();
        ring.push(message("005930", 1));
        ring.clear();
        assert!(ring.snapshot(&TickerCode::parse("005930").unwrap()).is_empty());
    }
}
