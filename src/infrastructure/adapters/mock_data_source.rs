//! Stand-in for exchange/filing data sources (spec.md §6.2
//! `DataSourceAdapter`). Generates deterministic synthetic bars and lets
//! tests drive live subscriptions by holding on to the sender half.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, Receiver};
use tokio::sync::RwLock;

use crate::domain::errors::FabricError;
use crate::domain::ports::{Bar, DataSourceAdapter, StreamMessage};
use crate::domain::user_config::TickerCode;

#[derive(Clone)]
pub struct MockDataSourceAdapter {
    /// Seed close price per ticker; bars walk deterministically from it.
    seed_prices: Arc<RwLock<HashMap<String, f64>>>,
    token_life: Duration,
}

impl MockDataSourceAdapter {
    pub fn new() -> Self {
        Self {
            seed_prices: Arc::new(RwLock::new(HashMap::new())),
            token_life: Duration::from_secs(3600),
        }
    }

    /// Test hook: lets a scenario assert the adapter reports a near-expiry
    /// token, driving Flow's §4.4 renewal path.
    pub fn with_token_remaining(mut self, remaining: Duration) -> Self {
        self.token_life = remaining;
        self
    }
}

impl Default for MockDataSourceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSourceAdapter for MockDataSourceAdapter {
    async fn fetch_history(
        &self,
        ticker: &TickerCode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, FabricError> {
        if end < start {
            return Err(FabricError::Invalid(
                "fetch_history: end precedes start".to_string(),
            ));
        }

        let base = {
            let seeds = self.seed_prices.read().await;
            *seeds.get(ticker.as_str()).unwrap_or(&50_000.0)
        };

        let span = (end - start).num_minutes().max(1);
        let bar_count = (span / 5).clamp(1, 500) as usize;
        let mut bars = Vec::with_capacity(bar_count);
        for i in 0..bar_count {
            let drift = (i as f64).sin() * (base * 0.01);
            let close = base + drift;
            bars.push(Bar {
                ticker: ticker.clone(),
                timestamp: start + chrono::Duration::minutes(i as i64 * 5),
                open: close - 1.0,
                high: close + 2.0,
                low: close - 2.0,
                close,
                volume: 1_000 + i as u64 * 10,
            });
        }
        Ok(bars)
    }

    async fn subscribe(&self, _ticker: &TickerCode) -> Result<Receiver<StreamMessage>, FabricError> {
        let (_tx, rx) = mpsc::channel(16);
        Ok(rx)
    }

    async fn unsubscribe(&self, _ticker: &TickerCode) -> Result<(), FabricError> {
        Ok(())
    }

    fn token_remaining_life(&self) -> Duration {
        self.token_life
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_history_rejects_inverted_range() {
        let adapter = MockDataSourceAdapter::new();
        let ticker = TickerCode::parse("005930").unwrap();
        let now = Utc::now();
        let result = adapter.fetch_history(&ticker, now, now - chrono::Duration::minutes(5)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn fetch_history_produces_bars_spanning_range() {
        let adapter = MockDataSourceAdapter::new();
        let ticker = TickerCode::parse("005930").unwrap();
        let now = Utc::now();
        let bars = adapter
            .fetch_history(&ticker, now - chrono::Duration::hours(1), now)
            .await
            .unwrap();
        assert!(!bars.is_empty());
        assert!(bars.iter().all(|b| b.high >= b.low));
    }

    #[test]
    fn token_remaining_life_is_configurable() {
        let adapter = MockDataSourceAdapter::new().with_token_remaining(Duration::from_secs(60));
        assert_eq!(adapter.token_remaining_life(), Duration::from_secs(60));
    }
}
