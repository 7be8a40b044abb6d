//! Per-user personalization snapshot.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::service_kind::ServiceKind;

/// A 6-character exchange ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct TickerCode(String);

impl TickerCode {
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.len() == 6 && raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(Self(raw.to_ascii_uppercase()))
        } else {
            Err(format!("ticker code must be 6 alphanumeric characters, got {raw:?}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// LLM backend choice: closed tagged-variant, never a string-keyed
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmKind {
    HyperClova,
    Gemini,
    OpenAI,
    Claude,
}

impl fmt::Display for LlmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LlmKind::HyperClova => "hyper_clova",
            LlmKind::Gemini => "gemini",
            LlmKind::OpenAI => "open_ai",
            LlmKind::Claude => "claude",
        };
        f.write_str(s)
    }
}

impl FromStr for LlmKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "hyper_clova" | "hyperclova" => Ok(LlmKind::HyperClova),
            "gemini" => Ok(LlmKind::Gemini),
            "open_ai" | "openai" => Ok(LlmKind::OpenAI),
            "claude" => Ok(LlmKind::Claude),
            other => Err(format!("unknown llm_choice: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub similarity: f64,
    pub impact: f64,
    pub relevance: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            similarity: 0.7,
            impact: 0.5,
            relevance: 0.5,
        }
    }
}

impl Thresholds {
    /// Validates every threshold is within `[0, 1]`.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("similarity", self.similarity),
            ("impact", self.impact),
            ("relevance", self.relevance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("threshold {name} must be in [0,1], got {value}"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub chat_id: Option<String>,
    /// Per-service notification toggle; absence defaults to disabled.
    pub per_service: HashMap<ServiceKind, bool>,
}

impl NotifyConfig {
    pub fn enabled_for(&self, kind: ServiceKind) -> bool {
        self.per_service.get(&kind).copied().unwrap_or(false)
    }
}

/// Read-mostly per-user snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub user_id: String,
    pub watched_tickers: HashSet<TickerCode>,
    pub thresholds: Thresholds,
    pub llm_choice: LlmKind,
    pub enabled_services: HashSet<ServiceKind>,
    pub notify: NotifyConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserConfig {
    /// The snapshot handed to a worker that has never rebound to a specific
    /// user: "default: system default user".
    pub fn system_default(now: DateTime<Utc>) -> Self {
        Self {
            user_id: "system".to_string(),
            watched_tickers: HashSet::new(),
            thresholds: Thresholds::default(),
            llm_choice: LlmKind::Gemini,
            enabled_services: ServiceKind::ALL.into_iter().collect(),
            notify: NotifyConfig::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied by `UserConfigStore::update_user_config`. Every
/// field is optional; `None` leaves the existing value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfigPatch {
    pub watched_tickers: Option<HashSet<TickerCode>>,
    pub thresholds: Option<Thresholds>,
    pub llm_choice: Option<LlmKind>,
    pub enabled_services: Option<HashSet<ServiceKind>>,
    pub notify: Option<NotifyConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_code_rejects_wrong_length() {
        assert!(TickerCode::parse("12345").is_err());
        assert!(TickerCode::parse("1234567").is_err());
        assert!(TickerCode::parse("005930").is_ok());
    }

    #[test]
    fn thresholds_reject_out_of_range() {
        let t = Thresholds {
            similarity: 1.5,
            impact: 0.5,
            relevance: 0.5,
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn llm_kind_round_trips() {
        for kind in [LlmKind::HyperClova, LlmKind::Gemini, LlmKind::OpenAI, LlmKind::Claude] {
            let s = kind.to_string();
            assert_eq!(LlmKind::from_str(&s).unwrap(), kind);
        }
    }
}
