//! In-memory `UserConfigStore` adapter with a TTL cache layer (spec.md §4.2).
//!
//! The real profile store lives behind whatever system owns phone
//! registration and watchlists; this crate ships only the in-process
//! fallback used by tests and by deployments that have not wired a real
//! store in. `InMemoryUserConfigStore` is itself a valid `UserConfigStore`;
//! `CachedUserConfigStore` wraps any other implementation with the
//! read-through cache worker lookups go through, mirroring the cache layer
//! the gateway keeps in front of its own backends.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::errors::FabricError;
use crate::domain::ports::UserConfigStore;
use crate::domain::user_config::{LlmKind, TickerCode, UserConfig, UserConfigPatch};

/// Reference `UserConfigStore`: an in-memory map keyed by `user_id`, seeded
/// lazily with `UserConfig::system_default` on first read.
pub struct InMemoryUserConfigStore {
    profiles: RwLock<HashMap<String, UserConfig>>,
    phones: RwLock<HashSet<String>>,
}

impl InMemoryUserConfigStore {
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            phones: RwLock::new(HashSet::new()),
        }
    }
}

impl Default for InMemoryUserConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserConfigStore for InMemoryUserConfigStore {
    async fn get_user_config(&self, user_id: &str) -> Result<UserConfig, FabricError> {
        if let Some(cfg) = self.profiles.read().get(user_id).cloned() {
            return Ok(cfg);
        }
        let mut cfg = UserConfig::system_default(Utc::now());
        cfg.user_id = user_id.to_string();
        self.profiles
            .write()
            .insert(user_id.to_string(), cfg.clone());
        Ok(cfg)
    }

    async fn update_user_config(
        &self,
        user_id: &str,
        patch: UserConfigPatch,
    ) -> Result<(), FabricError> {
        let mut profiles = self.profiles.write();
        let cfg = profiles
            .entry(user_id.to_string())
            .or_insert_with(|| {
                let mut cfg = UserConfig::system_default(Utc::now());
                cfg.user_id = user_id.to_string();
                cfg
            });

        if let Some(tickers) = patch.watched_tickers {
            cfg.watched_tickers = tickers;
        }
        if let Some(thresholds) = patch.thresholds {
            thresholds
                .validate()
                .map_err(FabricError::Invalid)?;
            cfg.thresholds = thresholds;
        }
        if let Some(llm_choice) = patch.llm_choice {
            cfg.llm_choice = llm_choice;
        }
        if let Some(enabled) = patch.enabled_services {
            cfg.enabled_services = enabled;
        }
        if let Some(notify) = patch.notify {
            cfg.notify = notify;
        }
        cfg.updated_at = Utc::now();
        Ok(())
    }

    async fn get_user_stocks(&self, user_id: &str) -> Result<Vec<TickerCode>, FabricError> {
        let cfg = self.get_user_config(user_id).await?;
        let mut tickers: Vec<TickerCode> = cfg.watched_tickers.into_iter().collect();
        tickers.sort();
        Ok(tickers)
    }

    async fn set_user_stocks(
        &self,
        user_id: &str,
        stocks: Vec<TickerCode>,
    ) -> Result<(), FabricError> {
        self.update_user_config(
            user_id,
            UserConfigPatch {
                watched_tickers: Some(stocks.into_iter().collect()),
                ..Default::default()
            },
        )
        .await
    }

    async fn get_model_choice(&self, user_id: &str) -> Result<LlmKind, FabricError> {
        Ok(self.get_user_config(user_id).await?.llm_choice)
    }

    async fn set_model_choice(&self, user_id: &str, kind: LlmKind) -> Result<(), FabricError> {
        self.update_user_config(
            user_id,
            UserConfigPatch {
                llm_choice: Some(kind),
                ..Default::default()
            },
        )
        .await
    }

    async fn register_profile(
        &self,
        user_id: &str,
        phone: Option<&str>,
    ) -> Result<(), FabricError> {
        if let Some(phone) = phone {
            let mut phones = self.phones.write();
            if !phones.insert(phone.to_string()) {
                return Err(FabricError::AlreadyExists(format!(
                    "phone number already registered: {phone}"
                )));
            }
        }
        let mut profiles = self.profiles.write();
        if profiles.contains_key(user_id) {
            return Err(FabricError::AlreadyExists(format!(
                "user already registered: {user_id}"
            )));
        }
        let mut cfg = UserConfig::system_default(Utc::now());
        cfg.user_id = user_id.to_string();
        profiles.insert(user_id.to_string(), cfg);
        Ok(())
    }
}

struct CachedEntry {
    config: UserConfig,
    cached_at: std::time::Instant,
}

/// Read-through TTL cache in front of any `UserConfigStore` (spec.md §4.2:
/// workers hold a short-lived local cache rather than calling the store on
/// every scheduler tick).
pub struct CachedUserConfigStore<S: UserConfigStore> {
    inner: Arc<S>,
    ttl: Duration,
    cache: RwLock<HashMap<String, CachedEntry>>,
}

impl<S: UserConfigStore> CachedUserConfigStore<S> {
    pub fn new(inner: Arc<S>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn invalidate(&self, user_id: &str) {
        self.cache.write().remove(user_id);
    }
}

#[async_trait]
impl<S: UserConfigStore> UserConfigStore for CachedUserConfigStore<S> {
    async fn get_user_config(&self, user_id: &str) -> Result<UserConfig, FabricError> {
        if let Some(entry) = self.cache.read().get(user_id) {
            if entry.cached_at.elapsed() < self.ttl {
                return Ok(entry.config.clone());
            }
        }
        let cfg = self.inner.get_user_config(user_id).await?;
        self.cache.write().insert(
            user_id.to_string(),
            CachedEntry {
                config: cfg.clone(),
                cached_at: std::time::Instant::now(),
            },
        );
        Ok(cfg)
    }

    async fn update_user_config(
        &self,
        user_id: &str,
        patch: UserConfigPatch,
    ) -> Result<(), FabricError> {
        self.inner.update_user_config(user_id, patch).await?;
        self.invalidate(user_id);
        Ok(())
    }

    async fn get_user_stocks(&self, user_id: &str) -> Result<Vec<TickerCode>, FabricError> {
        let cfg = self.get_user_config(user_id).await?;
        let mut tickers: Vec<TickerCode> = cfg.watched_tickers.into_iter().collect();
        tickers.sort();
        Ok(tickers)
    }

    async fn set_user_stocks(
        &self,
        user_id: &str,
        stocks: Vec<TickerCode>,
    ) -> Result<(), FabricError> {
        self.inner.set_user_stocks(user_id, stocks).await?;
        self.invalidate(user_id);
        Ok(())
    }

    async fn get_model_choice(&self, user_id: &str) -> Result<LlmKind, FabricError> {
        Ok(self.get_user_config(user_id).await?.llm_choice)
    }

    async fn set_model_choice(&self, user_id: &str, kind: LlmKind) -> Result<(), FabricError> {
        self.inner.set_model_choice(user_id, kind).await?;
        self.invalidate(user_id);
        Ok(())
    }

    async fn register_profile(
        &self,
        user_id: &str,
        phone: Option<&str>,
    ) -> Result<(), FabricError> {
        self.inner.register_profile(user_id, phone).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_user_gets_system_default_lazily() {
        let store = InMemoryUserConfigStore::new();
        let cfg = store.get_user_config("u1").await.unwrap();
        assert_eq!(cfg.user_id, "u1");
        assert!(cfg.watched_tickers.is_empty());
    }

    #[tokio::test]
    async fn patch_thresholds_rejects_out_of_range() {
        let store = InMemoryUserConfigStore::new();
        let bad = crate::domain::user_config::Thresholds {
            similarity: 2.0,
            impact: 0.5,
            relevance: 0.5,
        };
        let result = store
            .update_user_config(
                "u1",
                UserConfigPatch {
                    thresholds: Some(bad),
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn register_profile_rejects_duplicate_phone() {
        let store = InMemoryUserConfigStore::new();
        store.register_profile("u1", Some("010-0000-0000")).await.unwrap();
        let result = store.register_profile("u2", Some("010-0000-0000")).await;
        assert!(matches!(result, Err(FabricError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn cached_store_serves_stale_reads_within_ttl() {
        let inner = Arc::new(InMemoryUserConfigStore::new());
        let cached = CachedUserConfigStore::new(inner.clone(), Duration::from_secs(60));

        let first = cached.get_user_config("u1").await.unwrap();
        inner
            .update_user_config(
                "u1",
                UserConfigPatch {
                    llm_choice: Some(LlmKind::Claude),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Cached read still reflects the pre-update snapshot; the cache was
        // only bypassed going through `inner` directly above.
        let second = cached.get_user_config("u1").await.unwrap();
        assert_eq!(first.llm_choice, second.llm_choice);
    }

    #[tokio::test]
    async fn cached_store_update_invalidates_cache() {
        let inner = Arc::new(InMemoryUserConfigStore::new());
        let cached = CachedUserConfigStore::new(inner, Duration::from_secs(60));

        cached.get_user_config("u1").await.unwrap();
        cached
            .update_user_config(
                "u1",
                UserConfigPatch {
                    llm_choice: Some(LlmKind::Claude),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let cfg = cached.get_user_config("u1").await.unwrap();
        assert_eq!(cfg.llm_choice, LlmKind::Claude);
    }
}
