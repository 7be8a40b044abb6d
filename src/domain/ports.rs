//! Adapter contracts: the seams between the core and every external
//! collaborator (data sources, LLM vendors, chat transport, user-config
//! store, distributed cache). All methods are fallible and never panic — a
//! failing adapter call surfaces as `FabricError::AdapterFailure` to the
//! caller, it never crashes the worker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc::Receiver;

use crate::domain::errors::FabricError;
use crate::domain::signal::Signal;
use crate::domain::user_config::{LlmKind, TickerCode, UserConfig, UserConfigPatch};

/// A single OHLC bar returned by a data-source adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub ticker: TickerCode,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// A single message on a live subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMessage {
    pub ticker: TickerCode,
    pub received_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// `DataSourceAdapter`: exchange APIs, filing APIs, crawlers — out of scope
/// for the core, exposed only through this trait.
#[async_trait]
pub trait DataSourceAdapter: Send + Sync {
    async fn fetch_history(
        &self,
        ticker: &TickerCode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, FabricError>;

    /// Opens a live subscription; messages arrive on the returned channel
    /// until `unsubscribe` is called or the sender is dropped.
    async fn subscribe(&self, ticker: &TickerCode) -> Result<Receiver<StreamMessage>, FabricError>;

    async fn unsubscribe(&self, ticker: &TickerCode) -> Result<(), FabricError>;

    /// Remaining lifetime of the adapter's current auth/approval token.
    /// The Flow worker renews before this drops below 5 minutes.
    fn token_remaining_life(&self) -> Duration;
}

/// `LLMAdapter`: one implementation per [`LlmKind`].
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    fn kind(&self) -> LlmKind;
    async fn generate(&self, prompt: &str, params: &LlmParams) -> Result<String, FabricError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmParams {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// `NotificationAdapter`: the chat-notification transport.
#[async_trait]
pub trait NotificationAdapter: Send + Sync {
    async fn send_text(&self, channel_id: &str, message: &str) -> Result<(), FabricError>;

    async fn send_document(
        &self,
        channel_id: &str,
        bytes: Vec<u8>,
        filename: &str,
        caption: &str,
    ) -> Result<(), FabricError>;
}

/// `KVCache` (spec.md §6.2 / §4.1.3): abstracts the gateway's response cache
/// backend. `Distributed` implementations are preferred; `Local` is the
/// fallback (see `infrastructure::core::cache`).
#[async_trait]
pub trait KVCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<u8>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration);
    async fn clear(&self);
    async fn stats(&self) -> CacheStats;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

/// `UserConfigStore` (spec.md §4.2): the shared per-user profile store.
#[async_trait]
pub trait UserConfigStore: Send + Sync {
    async fn get_user_config(&self, user_id: &str) -> Result<UserConfig, FabricError>;
    async fn update_user_config(
        &self,
        user_id: &str,
        patch: UserConfigPatch,
    ) -> Result<(), FabricError>;

    async fn get_user_stocks(&self, user_id: &str) -> Result<Vec<TickerCode>, FabricError>;
    async fn set_user_stocks(
        &self,
        user_id: &str,
        stocks: Vec<TickerCode>,
    ) -> Result<(), FabricError>;

    async fn get_model_choice(&self, user_id: &str) -> Result<LlmKind, FabricError>;
    async fn set_model_choice(&self, user_id: &str, kind: LlmKind) -> Result<(), FabricError>;

    /// Registers a new profile. Returns `AlreadyExists` on a duplicate phone
    /// number, mirroring the original service's 409 behavior.
    async fn register_profile(
        &self,
        user_id: &str,
        phone: Option<&str>,
    ) -> Result<(), FabricError>;
}

/// Analysis pipeline contract each worker domain implements (News NLP,
/// chart indicators, disclosure parsing, flow detection, report
/// generation — all out of scope, see spec.md §1). A run emits zero or
/// more signals; per-ticker failures must not abort the run (spec.md §7).
#[async_trait]
pub trait AnalysisAdapter: Send + Sync {
    async fn run_for_ticker(
        &self,
        ticker: &TickerCode,
        config: &UserConfig,
    ) -> Result<Vec<Signal>, FabricError>;
}
