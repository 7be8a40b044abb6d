//! Stand-in for the chat notification transport (spec.md §6.2
//! `NotificationAdapter`; the original wires this to Telegram). Records
//! sent messages in memory so scenario tests can assert on delivery.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::FabricError;
use crate::domain::ports::NotificationAdapter;

#[derive(Debug, Clone)]
pub struct SentText {
    pub channel_id: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SentDocument {
    pub channel_id: String,
    pub filename: String,
    pub caption: String,
    pub bytes_len: usize,
}

#[derive(Default)]
pub struct MockNotificationAdapter {
    texts: Arc<RwLock<Vec<SentText>>>,
    documents: Arc<RwLock<Vec<SentDocument>>>,
}

impl MockNotificationAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent_texts(&self) -> Vec<SentText> {
        self.texts.read().await.clone()
    }

    pub async fn sent_documents(&self) -> Vec<SentDocument> {
        self.documents.read().await.clone()
    }
}

#[async_trait]
impl NotificationAdapter for MockNotificationAdapter {
    async fn send_text(&self, channel_id: &str, message: &str) -> Result<(), FabricError> {
        if channel_id.is_empty() {
            return Err(FabricError::Invalid("empty channel_id".to_string()));
        }
        self.texts.write().await.push(SentText {
            channel_id: channel_id.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn send_document(
        &self,
        channel_id: &str,
        bytes: Vec<u8>,
        filename: &str,
        caption: &str,
    ) -> Result<(), FabricError> {
        if channel_id.is_empty() {
            return Err(FabricError::Invalid("empty channel_id".to_string()));
        }
        self.documents.write().await.push(SentDocument {
            channel_id: channel_id.to_string(),
            filename: filename.to_string(),
            caption: caption.to_string(),
            bytes_len: bytes.len(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_text_is_recorded() {
        let adapter = MockNotificationAdapter::new();
        adapter.send_text("chat-1", "signal fired").await.unwrap();
        let sent = adapter.sent_texts().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message, "signal fired");
    }

    #[tokio::test]
    async fn send_rejects_empty_channel() {
        let adapter = MockNotificationAdapter::new();
        let result = adapter.send_text("", "x").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn send_document_is_recorded() {
        let adapter = MockNotificationAdapter::new();
        adapter
            .send_document("chat-1", vec![1, 2, 3], "report.pdf", "weekly report")
            .await
            .unwrap();
        let docs = adapter.sent_documents().await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].bytes_len, 3);
    }
}
