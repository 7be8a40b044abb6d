//! In-memory per-user signal store (spec.md §4.5, L2).
//!
//! Each user/service pair keeps a bounded ring buffer of the most recent
//! signals plus a `latest` slot for O(1) polling. Guarded by `parking_lot`
//! the way the teacher guards its low-write-rate shared state, since signal
//! appends never need to hold across an `.await` point.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::service_kind::ServiceKind;
use crate::domain::signal::Signal;

const RING_CAPACITY: usize = 100;

#[derive(Default)]
struct UserServiceLog {
    ring: Vec<Signal>,
    latest: Option<Signal>,
}

impl UserServiceLog {
    fn push(&mut self, signal: Signal) {
        if self.ring.len() == RING_CAPACITY {
            self.ring.remove(0);
        }
        self.ring.push(signal.clone());
        self.latest = Some(signal);
    }
}

/// Append-only signal log keyed by `(user_id, service)`.
pub struct SignalStore {
    logs: RwLock<HashMap<(String, ServiceKind), UserServiceLog>>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a signal, evicting the oldest entry once the ring is full.
    pub fn append(&self, user_id: &str, service: ServiceKind, signal: Signal) {
        let mut logs = self.logs.write();
        logs.entry((user_id.to_string(), service))
            .or_default()
            .push(signal);
    }

    /// Returns up to `limit` most recent signals, in insertion order
    /// (oldest of the returned window first, most-recent-last — spec.md
    /// §4.5 `listRecent`).
    pub fn list_recent(&self, user_id: &str, service: ServiceKind, limit: usize) -> Vec<Signal> {
        let logs = self.logs.read();
        match logs.get(&(user_id.to_string(), service)) {
            Some(log) => {
                let len = log.ring.len();
                let skip = len.saturating_sub(limit);
                log.ring.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Returns the most recently appended signal, if any.
    pub fn latest_or_none(&self, user_id: &str, service: ServiceKind) -> Option<Signal> {
        let logs = self.logs.read();
        logs.get(&(user_id.to_string(), service))
            .and_then(|log| log.latest.clone())
    }
}

impl Default for SignalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user_config::TickerCode;
    use serde_json::json;

    fn signal(i: u32) -> Signal {
        Signal::new(
            TickerCode::parse("005930").unwrap(),
            ServiceKind::Chart,
            format!("seq-{i}"),
            json!({ "seq": i }),
        )
    }

    #[test]
    fn latest_reflects_most_recent_append() {
        let store = SignalStore::new();
        store.append("u1", ServiceKind::Chart, signal(1));
        store.append("u1", ServiceKind::Chart, signal(2));

        let latest = store.latest_or_none("u1", ServiceKind::Chart).unwrap();
        assert_eq!(latest.payload["seq"], 2);
    }

    #[test]
    fn ring_evicts_oldest_past_capacity() {
        let store = SignalStore::new();
        for i in 0..(RING_CAPACITY as u32 + 10) {
            store.append("u1", ServiceKind::News, signal(i));
        }

        let recent = store.list_recent("u1", ServiceKind::News, RING_CAPACITY);
        assert_eq!(recent.len(), RING_CAPACITY);
        // Insertion order, most-recent-last (spec.md §4.5): the oldest
        // surviving entry (the tenth append; 0..=9 were evicted) comes
        // first, the most recently pushed sequence number comes last.
        assert_eq!(recent[0].payload["seq"], 10);
        assert_eq!(recent.last().unwrap().payload["seq"], RING_CAPACITY as u32 + 9);
    }

    #[test]
    fn users_and_services_are_isolated() {
        let store = SignalStore::new();
        store.append("u1", ServiceKind::Chart, signal(1));
        store.append("u2", ServiceKind::Chart, signal(2));
        store.append("u1", ServiceKind::News, signal(3));

        assert_eq!(
            store.latest_or_none("u1", ServiceKind::Chart).unwrap().payload["seq"],
            1
        );
        assert_eq!(
            store.latest_or_none("u2", ServiceKind::Chart).unwrap().payload["seq"],
            2
        );
        assert_eq!(
            store.latest_or_none("u1", ServiceKind::News).unwrap().payload["seq"],
            3
        );
    }

    #[test]
    fn list_recent_preserves_insertion_order() {
        // spec.md §8 scenario f: emitting S1, S2, S3 then listing recent
        // signals must yield them in the order emitted, most-recent-last.
        let store = SignalStore::new();
        store.append("u1", ServiceKind::Chart, signal(1));
        store.append("u1", ServiceKind::Chart, signal(2));
        store.append("u1", ServiceKind::Chart, signal(3));

        let recent = store.list_recent("u1", ServiceKind::Chart, 100);
        let seqs: Vec<i64> = recent.iter().map(|s| s.payload["seq"].as_i64().unwrap()).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(store.latest_or_none("u1", ServiceKind::Chart).unwrap().payload["seq"], 3);
    }

    #[test]
    fn missing_user_returns_none() {
        let store = SignalStore::new();
        assert!(store.latest_or_none("ghost", ServiceKind::Report).is_none());
        assert!(store.list_recent("ghost", ServiceKind::Report, 10).is_empty());
    }
}
