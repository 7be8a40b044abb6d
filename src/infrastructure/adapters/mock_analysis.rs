//! Stand-in analysis pipeline (spec.md §6.2 `AnalysisAdapter`). The real
//! NLP/indicator/disclosure-parsing logic per service is out of scope
//! (spec.md §1); this emits a single signal per ticker whose thresholds
//! clear the user's configured `impact` bar, so the surrounding worker and
//! scheduler plumbing can be exercised without a live pipeline.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::errors::FabricError;
use crate::domain::ports::AnalysisAdapter;
use crate::domain::signal::Signal;
use crate::domain::service_kind::ServiceKind;
use crate::domain::user_config::{TickerCode, UserConfig};

pub struct MockAnalysisAdapter {
    kind: ServiceKind,
    /// Deterministic synthetic impact score handed to every ticker, used to
    /// exercise the threshold gate without a live pipeline.
    synthetic_impact: f64,
}

impl MockAnalysisAdapter {
    pub fn new(kind: ServiceKind) -> Self {
        Self {
            kind,
            synthetic_impact: 0.8,
        }
    }

    pub fn with_synthetic_impact(mut self, impact: f64) -> Self {
        self.synthetic_impact = impact;
        self
    }
}

#[async_trait]
impl AnalysisAdapter for MockAnalysisAdapter {
    async fn run_for_ticker(
        &self,
        ticker: &TickerCode,
        config: &UserConfig,
    ) -> Result<Vec<Signal>, FabricError> {
        if self.synthetic_impact < config.thresholds.impact {
            return Ok(Vec::new());
        }
        let signal = Signal::new(
            ticker.clone(),
            self.kind,
            format!("{} crossed impact threshold for {ticker}", self.kind),
            json!({ "impact": self.synthetic_impact }),
        );
        Ok(vec![signal])
    }
}
