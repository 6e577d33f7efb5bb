use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Lifecycle of a captured call. Only `Received -> Processed` and
/// `Received -> Failed` are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Received,
    Processed,
    Failed,
}

impl WebhookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookStatus::Received => "received",
            WebhookStatus::Processed => "processed",
            WebhookStatus::Failed => "failed",
        }
    }

    pub fn can_transition_to(&self, next: WebhookStatus) -> bool {
        matches!(
            (self, next),
            (WebhookStatus::Received, WebhookStatus::Processed)
                | (WebhookStatus::Received, WebhookStatus::Failed)
        )
    }
}

impl fmt::Display for WebhookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "received" => Ok(WebhookStatus::Received),
            "processed" => Ok(WebhookStatus::Processed),
            "failed" => Ok(WebhookStatus::Failed),
            other => Err(Error::Internal(format!("unknown webhook status: {}", other))),
        }
    }
}

/// Captured request body.
///
/// `Json` holds either a parsed JSON body or, for GET requests, the query
/// parameter map. `Raw` is a non-empty body that was not valid JSON.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    Json(JsonValue),
    Raw(String),
    #[default]
    Empty,
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Bytes sent as the body of a replayed request, `None` when there is no body.
    pub fn to_json_bytes(&self) -> Result<Option<Vec<u8>>> {
        match self {
            Payload::Json(value) => Ok(Some(serde_json::to_vec(value)?)),
            Payload::Raw(raw) => Ok(Some(serde_json::to_vec(raw)?)),
            Payload::Empty => Ok(None),
        }
    }

    /// Column values as stored: `(body, raw_body)`.
    pub fn into_columns(self) -> (Option<JsonValue>, Option<String>) {
        match self {
            Payload::Json(value) => (Some(value), None),
            Payload::Raw(raw) => (None, Some(raw)),
            Payload::Empty => (None, None),
        }
    }

    pub fn from_columns(body: Option<JsonValue>, raw_body: Option<String>) -> Self {
        match (body, raw_body) {
            (Some(value), _) => Payload::Json(value),
            (None, Some(raw)) => Payload::Raw(raw),
            (None, None) => Payload::Empty,
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Payload::Json(value) => value.serialize(serializer),
            Payload::Raw(raw) => serializer.serialize_str(raw),
            Payload::Empty => serde_json::Map::new().serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookLog {
    pub id: Uuid,
    pub endpoint_id: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Payload,
    pub ip_address: String,
    pub user_agent: String,
    pub status: WebhookStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the capture pipeline knows about an inbound call before it
/// becomes a record.
#[derive(Debug, Clone)]
pub struct NewWebhookLog {
    pub endpoint_id: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Payload,
    pub ip_address: String,
    pub user_agent: String,
}

impl WebhookLog {
    pub fn received(new: NewWebhookLog, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint_id: new.endpoint_id,
            method: new.method,
            headers: new.headers,
            body: new.body,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            status: WebhookStatus::Received,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_processed(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(WebhookStatus::Processed, now)?;
        self.processed_at = Some(now);
        Ok(())
    }

    pub fn mark_failed(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(WebhookStatus::Failed, now)
    }

    fn transition(&mut self, next: WebhookStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::Internal(format!(
                "illegal status transition {} -> {} for webhook {}",
                self.status, next, self.id
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}
