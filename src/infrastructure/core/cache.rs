//! `KVCache` backends for the gateway's response cache (spec.md §4.1.3).
//!
//! `LocalCache` is capacity-bounded (<=1000 entries, spec.md §8 boundary
//! case: "inserting the 1001st local-cache entry evicts exactly one
//! earliest-expiring entry") with eviction driven by an explicit expiry
//! index rather than an opaque LFU policy, grounded in the TTL-keyed cache
//! shape `borsa-middleware`'s `cache.rs` builds around `moka::future::Cache`
//! — this module keeps that entry/TTL shape but tracks expiry order itself
//! so the overflow invariant is exact, not approximate.
//! `DistributedCache` is the preferred backend when a distributed-cache URL
//! is configured; this crate ships only a loopback-to-local fallback since
//! the real backend (Redis or similar) is an opaque external collaborator
//! per spec.md §1.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::ports::{CacheStats, KVCache};

const LOCAL_CACHE_CAPACITY: usize = 1000;

#[derive(Clone)]
struct Entry {
    bytes: Vec<u8>,
    expires_at: Instant,
    /// Tie-breaker for the expiry index: two entries can share an
    /// `Instant` on fast clocks, and `BTreeMap` keys must be unique.
    seq: u64,
}

#[derive(Default)]
struct Inner {
    entries: std::collections::HashMap<String, Entry>,
    /// `(expires_at, seq) -> key`, kept in sync with `entries` so the
    /// earliest-expiring key is always `expiry_index.keys().next()`.
    expiry_index: BTreeMap<(Instant, u64), String>,
    next_seq: u64,
}

impl Inner {
    fn remove(&mut self, key: &str) {
        if let Some(old) = self.entries.remove(key) {
            self.expiry_index.remove(&(old.expires_at, old.seq));
        }
    }

    fn insert(&mut self, key: String, bytes: Vec<u8>, ttl: Duration) {
        self.remove(&key);

        if self.entries.len() >= LOCAL_CACHE_CAPACITY {
            if let Some((&index_key, evicted_key)) = self.expiry_index.iter().next().map(|(k, v)| (k, v.clone())) {
                self.expiry_index.remove(&index_key);
                self.entries.remove(&evicted_key);
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let expires_at = Instant::now() + ttl;
        self.expiry_index.insert((expires_at, seq), key.clone());
        self.entries.insert(key, Entry { bytes, expires_at, seq });
    }

    fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        let (expires_at, seq, bytes) = {
            let entry = self.entries.get(key)?;
            (entry.expires_at, entry.seq, entry.bytes.clone())
        };

        if expires_at <= Instant::now() {
            self.entries.remove(key);
            self.expiry_index.remove(&(expires_at, seq));
            return None;
        }
        Some(bytes)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.expiry_index.clear();
    }
}

/// In-process cache, single-writer-friendly via a coarse `RwLock` (write
/// rate is low per spec.md §5, same reasoning as the signal store).
pub struct LocalCache {
    inner: RwLock<Inner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LocalCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Number of live entries, for tests exercising the overflow boundary.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KVCache for LocalCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let result = self.inner.write().get(key);
        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.inner.write().insert(key.to_string(), value, ttl);
    }

    async fn clear(&self) {
        self.inner.write().clear();
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.read().entries.len() as u64,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = LocalCache::new();
        cache.set("k", b"v".to_vec(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn clear_drops_all_entries() {
        let cache = LocalCache::new();
        cache.set("k", b"v".to_vec(), Duration::from_secs(60)).await;
        cache.clear().await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn miss_is_counted() {
        let cache = LocalCache::new();
        assert_eq!(cache.get("missing").await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_treated_as_a_miss() {
        let cache = LocalCache::new();
        cache.set("k", b"v".to_vec(), Duration::from_millis(1)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("k").await, None);
    }

    /// spec.md §8 boundary case: inserting the 1001st entry evicts exactly
    /// one earliest-expiring entry.
    #[tokio::test]
    async fn overflow_evicts_exactly_one_earliest_expiring_entry() {
        let cache = LocalCache::new();
        for i in 0..LOCAL_CACHE_CAPACITY {
            // Ascending TTLs: entry 0 expires soonest.
            cache
                .set(&format!("k{i}"), vec![0], Duration::from_secs(1000 + i as u64))
                .await;
        }
        assert_eq!(cache.len(), LOCAL_CACHE_CAPACITY);

        cache
            .set("overflow", vec![0], Duration::from_secs(5000))
            .await;

        assert_eq!(cache.len(), LOCAL_CACHE_CAPACITY);
        assert_eq!(cache.get("k0").await, None, "earliest-expiring entry must be evicted");
        assert_eq!(cache.get("k1").await, Some(vec![0]), "later-expiring entries survive");
        assert_eq!(cache.get("overflow").await, Some(vec![0]));
    }
}
