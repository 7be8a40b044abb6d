//! A domain emission produced by a worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::service_kind::ServiceKind;
use crate::domain::user_config::TickerCode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub stock_code: TickerCode,
    pub emitted_at: DateTime<Utc>,
    pub kind: ServiceKind,
    pub payload: serde_json::Value,
    pub message: String,
}

impl Signal {
    pub fn new(
        stock_code: TickerCode,
        kind: ServiceKind,
        message: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            stock_code,
            emitted_at: Utc::now(),
            kind,
            payload,
            message: message.into(),
        }
    }
}
