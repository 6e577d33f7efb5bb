use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::webhook_log::{WebhookLog, WebhookStatus};
use crate::services::log_store::{with_deadline, WebhookLogStore, READ_TIMEOUT, WRITE_TIMEOUT};

/// Query and retention operations over captured calls. Every store call is
/// bounded by the write or read deadline.
#[derive(Clone)]
pub struct WebhookLogService {
    store: Arc<dyn WebhookLogStore>,
}

impl WebhookLogService {
    pub fn new(store: Arc<dyn WebhookLogStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, log: &WebhookLog) -> Result<()> {
        with_deadline(WRITE_TIMEOUT, "insert webhook log", self.store.insert(log)).await?;
        info!(webhook_id = %log.id, endpoint_id = %log.endpoint_id, "Webhook log stored");
        Ok(())
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: WebhookStatus,
        processed_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        with_deadline(
            WRITE_TIMEOUT,
            "update webhook log",
            self.store.update_status(id, status, processed_at, updated_at),
        )
        .await
    }

    /// `limit` must already be clamped by the caller.
    pub async fn list_by_endpoint(&self, endpoint_id: &str, limit: i64) -> Result<Vec<WebhookLog>> {
        with_deadline(
            READ_TIMEOUT,
            "list webhook logs",
            self.store.list_by_endpoint(endpoint_id, limit),
        )
        .await
    }

    pub async fn get_by_id(&self, raw_id: &str) -> Result<WebhookLog> {
        let id = parse_log_id(raw_id)?;
        with_deadline(READ_TIMEOUT, "find webhook log", self.store.get_by_id(id)).await
    }

    pub async fn delete_by_endpoint(&self, endpoint_id: &str) -> Result<u64> {
        let deleted = with_deadline(
            READ_TIMEOUT,
            "delete webhook logs",
            self.store.delete_by_endpoint(endpoint_id),
        )
        .await?;
        info!(endpoint_id, deleted, "Cleared webhook logs");
        Ok(deleted)
    }
}

pub fn parse_log_id(raw_id: &str) -> Result<Uuid> {
    Uuid::parse_str(raw_id.trim())
        .map_err(|e| Error::InvalidId(format!("invalid webhook log ID {:?}: {}", raw_id, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::MemoryWebhookLogStore;

    fn service() -> WebhookLogService {
        WebhookLogService::new(Arc::new(MemoryWebhookLogStore::new()))
    }

    #[tokio::test]
    async fn malformed_and_missing_ids_are_distinct() {
        let logs = service();

        let malformed = logs.get_by_id("not-a-uuid").await.unwrap_err();
        assert!(matches!(malformed, Error::InvalidId(_)));

        let missing = logs.get_by_id(&Uuid::new_v4().to_string()).await.unwrap_err();
        assert!(matches!(missing, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_unknown_endpoint_is_zero() {
        assert_eq!(service().delete_by_endpoint("ghost").await.unwrap(), 0);
    }
}
