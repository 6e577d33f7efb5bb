use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::webhook_log::{WebhookLog, WebhookStatus};
use crate::services::log_store::WebhookLogStore;

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryWebhookLogStore {
    logs: RwLock<HashMap<Uuid, WebhookLog>>,
}

impl MemoryWebhookLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.logs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.logs.read().await.is_empty()
    }
}

#[async_trait]
impl WebhookLogStore for MemoryWebhookLogStore {
    async fn insert(&self, log: &WebhookLog) -> Result<()> {
        let mut logs = self.logs.write().await;
        if logs.contains_key(&log.id) {
            return Err(Error::Internal(format!("duplicate webhook log id {}", log.id)));
        }
        logs.insert(log.id, log.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: WebhookStatus,
        processed_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut logs = self.logs.write().await;
        let log = logs
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("webhook log {}", id)))?;
        log.status = status;
        log.processed_at = processed_at;
        log.updated_at = updated_at;
        Ok(())
    }

    async fn list_by_endpoint(&self, endpoint_id: &str, limit: i64) -> Result<Vec<WebhookLog>> {
        let logs = self.logs.read().await;
        let mut matching: Vec<WebhookLog> = logs
            .values()
            .filter(|log| log.endpoint_id == endpoint_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<WebhookLog> {
        self.logs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("webhook log {}", id)))
    }

    async fn delete_by_endpoint(&self, endpoint_id: &str) -> Result<u64> {
        let mut logs = self.logs.write().await;
        let before = logs.len();
        logs.retain(|_, log| log.endpoint_id != endpoint_id);
        Ok((before - logs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::webhook_log::{NewWebhookLog, Payload};
    use chrono::Duration;

    fn log_at(endpoint: &str, created_at: DateTime<Utc>) -> WebhookLog {
        WebhookLog::received(
            NewWebhookLog {
                endpoint_id: endpoint.to_string(),
                method: "POST".into(),
                headers: HashMap::new(),
                body: Payload::Empty,
                ip_address: String::new(),
                user_agent: String::new(),
            },
            created_at,
        )
    }

    #[tokio::test]
    async fn lists_newest_first_and_respects_limit() {
        let store = MemoryWebhookLogStore::new();
        let base = Utc::now();
        for offset in [3, 1, 2] {
            store
                .insert(&log_at("orders", base + Duration::seconds(offset)))
                .await
                .unwrap();
        }
        store.insert(&log_at("billing", base)).await.unwrap();

        let listed = store.list_by_endpoint("orders", 2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].created_at, base + Duration::seconds(3));
        assert_eq!(listed[1].created_at, base + Duration::seconds(2));
    }

    #[tokio::test]
    async fn rejects_duplicate_ids() {
        let store = MemoryWebhookLogStore::new();
        let log = log_at("orders", Utc::now());
        store.insert(&log).await.unwrap();
        assert!(store.insert(&log).await.is_err());
    }

    #[tokio::test]
    async fn update_touches_only_lifecycle_fields() {
        let store = MemoryWebhookLogStore::new();
        let log = log_at("orders", Utc::now());
        store.insert(&log).await.unwrap();

        let later = log.created_at + Duration::seconds(1);
        store
            .update_status(log.id, WebhookStatus::Processed, Some(later), later)
            .await
            .unwrap();

        let stored = store.get_by_id(log.id).await.unwrap();
        assert_eq!(stored.status, WebhookStatus::Processed);
        assert_eq!(stored.processed_at, Some(later));
        assert_eq!(stored.created_at, log.created_at);
        assert_eq!(stored.endpoint_id, "orders");

        let missing = store
            .update_status(Uuid::new_v4(), WebhookStatus::Processed, None, later)
            .await
            .unwrap_err();
        assert!(matches!(missing, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_counts_removed_records() {
        let store = MemoryWebhookLogStore::new();
        store.insert(&log_at("orders", Utc::now())).await.unwrap();
        store.insert(&log_at("orders", Utc::now())).await.unwrap();
        store.insert(&log_at("billing", Utc::now())).await.unwrap();

        assert_eq!(store.delete_by_endpoint("orders").await.unwrap(), 2);
        assert_eq!(store.delete_by_endpoint("orders").await.unwrap(), 0);
        assert_eq!(store.delete_by_endpoint("nobody").await.unwrap(), 0);
        assert_eq!(store.len().await, 1);
    }
}
