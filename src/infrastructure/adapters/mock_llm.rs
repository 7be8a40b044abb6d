//! Stand-in for the HyperCLOVA/Gemini/OpenAI/Claude vendor clients
//! (spec.md §6.2 `LlmAdapter`). One instance per `LlmKind`; `generate`
//! returns a deterministic templated response rather than calling out.

use async_trait::async_trait;

use crate::domain::errors::FabricError;
use crate::domain::ports::{LlmAdapter, LlmParams};
use crate::domain::user_config::LlmKind;

pub struct MockLlmAdapter {
    kind: LlmKind,
}

impl MockLlmAdapter {
    pub fn new(kind: LlmKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl LlmAdapter for MockLlmAdapter {
    fn kind(&self) -> LlmKind {
        self.kind
    }

    async fn generate(&self, prompt: &str, params: &LlmParams) -> Result<String, FabricError> {
        if prompt.trim().is_empty() {
            return Err(FabricError::Invalid("empty prompt".to_string()));
        }
        let max_tokens = params.max_tokens.unwrap_or(256);
        let truncated: String = prompt.chars().take(max_tokens as usize).collect();
        Ok(format!("[{}] {}", self.kind, truncated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generate_echoes_vendor_tag() {
        let adapter = MockLlmAdapter::new(LlmKind::Gemini);
        let out = adapter
            .generate("summarize this disclosure", &LlmParams::default())
            .await
            .unwrap();
        assert!(out.starts_with("[gemini]"));
    }

    #[tokio::test]
    async fn generate_rejects_empty_prompt() {
        let adapter = MockLlmAdapter::new(LlmKind::Claude);
        let result = adapter.generate("   ", &LlmParams::default()).await;
        assert!(result.is_err());
    }
}
