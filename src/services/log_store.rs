use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{types::Json, FromRow, PgPool};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::webhook_log::{Payload, WebhookLog, WebhookStatus};

pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Durable collection of captured webhook calls.
///
/// Implementations only enforce id uniqueness; there is no cross-record
/// consistency and concurrent writers interleave freely.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookLogStore: Send + Sync {
    async fn insert(&self, log: &WebhookLog) -> Result<()>;

    /// Rewrites only the mutable lifecycle fields. `NotFound` if the id is unknown.
    async fn update_status(
        &self,
        id: Uuid,
        status: WebhookStatus,
        processed_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Newest first, at most `limit` records.
    async fn list_by_endpoint(&self, endpoint_id: &str, limit: i64) -> Result<Vec<WebhookLog>>;

    async fn get_by_id(&self, id: Uuid) -> Result<WebhookLog>;

    async fn delete_by_endpoint(&self, endpoint_id: &str) -> Result<u64>;
}

/// Fails with `Error::Timeout` instead of waiting past `limit`.
pub async fn with_deadline<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "{} did not complete within {}s",
            operation,
            limit.as_secs()
        ))),
    }
}

#[derive(Debug, FromRow)]
struct WebhookLogRow {
    id: Uuid,
    endpoint_id: String,
    method: String,
    headers: Json<HashMap<String, String>>,
    body: Option<JsonValue>,
    raw_body: Option<String>,
    ip_address: String,
    user_agent: String,
    status: String,
    processed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WebhookLogRow> for WebhookLog {
    type Error = Error;

    fn try_from(row: WebhookLogRow) -> Result<Self> {
        Ok(WebhookLog {
            id: row.id,
            endpoint_id: row.endpoint_id,
            method: row.method,
            headers: row.headers.0,
            body: Payload::from_columns(row.body, row.raw_body),
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            status: row.status.parse()?,
            processed_at: row.processed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgWebhookLogStore {
    pool: PgPool,
}

impl PgWebhookLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookLogStore for PgWebhookLogStore {
    async fn insert(&self, log: &WebhookLog) -> Result<()> {
        let (body, raw_body) = log.body.clone().into_columns();
        sqlx::query(
            r#"
            INSERT INTO webhook_logs
                (id, endpoint_id, method, headers, body, raw_body, ip_address, user_agent,
                 status, processed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(log.id)
        .bind(&log.endpoint_id)
        .bind(&log.method)
        .bind(Json(&log.headers))
        .bind(body)
        .bind(raw_body)
        .bind(&log.ip_address)
        .bind(&log.user_agent)
        .bind(log.status.as_str())
        .bind(log.processed_at)
        .bind(log.created_at)
        .bind(log.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: WebhookStatus,
        processed_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_logs
            SET status = $1, processed_at = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(status.as_str())
        .bind(processed_at)
        .bind(updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("webhook log {}", id)));
        }
        Ok(())
    }

    async fn list_by_endpoint(&self, endpoint_id: &str, limit: i64) -> Result<Vec<WebhookLog>> {
        let rows = sqlx::query_as::<_, WebhookLogRow>(
            r#"
            SELECT * FROM webhook_logs
            WHERE endpoint_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(endpoint_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WebhookLog::try_from).collect()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<WebhookLog> {
        let row = sqlx::query_as::<_, WebhookLogRow>(
            r#"SELECT * FROM webhook_logs WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(Error::NotFound(format!("webhook log {}", id))),
        }
    }

    async fn delete_by_endpoint(&self, endpoint_id: &str) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM webhook_logs WHERE endpoint_id = $1"#)
            .bind(endpoint_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_a_hung_call_into_timeout() {
        let hung = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, Error>(())
        };
        let err = with_deadline(WRITE_TIMEOUT, "insert", hung).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.is_store_error());
    }

    #[tokio::test]
    async fn deadline_passes_through_results() {
        let value = with_deadline(READ_TIMEOUT, "find", async { Ok::<_, Error>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
