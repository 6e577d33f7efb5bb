use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::models::webhook_log::{WebhookLog, WebhookStatus};

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveResponse {
    pub message: &'static str,
    pub endpoint_id: String,
    pub method: String,
    pub webhook_id: Uuid,
    pub status: WebhookStatus,
    pub timestamp: DateTime<Utc>,
}

impl From<&WebhookLog> for ReceiveResponse {
    fn from(log: &WebhookLog) -> Self {
        Self {
            message: "Webhook received and processed",
            endpoint_id: log.endpoint_id.clone(),
            method: log.method.clone(),
            webhook_id: log.id,
            status: log.status,
            timestamp: log.created_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct LogsQuery {
    pub limit: Option<String>,
}

impl LogsQuery {
    /// First occurrence of each key wins; repeated keys never reject the request.
    pub fn parse(raw_query: Option<&str>) -> Self {
        let limit = raw_query.and_then(|raw| {
            url::form_urlencoded::parse(raw.as_bytes())
                .find(|(key, _)| key == "limit")
                .map(|(_, value)| value.into_owned())
        });
        Self { limit }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    pub endpoint_id: String,
    pub logs: Vec<WebhookLog>,
    pub count: usize,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearLogsResponse {
    pub message: &'static str,
    pub endpoint_id: String,
    pub deleted_count: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplayPayload {
    #[validate(required, url)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub timeout: i64,
}

#[derive(Debug, Serialize)]
pub struct ReplayResponse {
    pub message: &'static str,
    pub webhook_log_id: String,
    pub target_url: String,
    pub result: ReplayResult,
}

/// Outcome of one replay. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    pub response_headers: HashMap<String, String>,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplayResult {
    pub fn failed(error: String, duration: Duration) -> Self {
        Self {
            success: false,
            status_code: None,
            response_body: None,
            response_headers: HashMap::new(),
            duration,
            error: Some(error),
        }
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
