use axum::http::{header::USER_AGENT, HeaderMap, Method};
use bytes::Bytes;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::Error;
use crate::models::webhook_log::{NewWebhookLog, Payload, WebhookLog};
use crate::services::log_service::WebhookLogService;
use crate::services::trigger::{self, ActionTrigger};
use crate::utils::time::now;

/// An inbound call as it arrived, before normalization.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub endpoint_id: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub raw_query: Option<String>,
    pub body: Bytes,
    pub ip_address: String,
}

/// The initial write failed. The record is returned in its `failed` state
/// alongside the cause; it was never persisted.
#[derive(Debug, thiserror::Error)]
#[error("failed to store webhook log {}: {}", .record.id, .error)]
pub struct CaptureFailure {
    pub record: WebhookLog,
    pub error: Error,
}

#[derive(Clone)]
pub struct CaptureService {
    logs: WebhookLogService,
    trigger: Arc<dyn ActionTrigger>,
}

impl CaptureService {
    pub fn new(logs: WebhookLogService, trigger: Arc<dyn ActionTrigger>) -> Self {
        Self { logs, trigger }
    }

    /// Normalizes and stores one call, then hands a copy to the trigger stage.
    ///
    /// Exactly one insert and at most one update. Once the insert succeeds the
    /// capture succeeds; a failed status update is only logged.
    pub async fn capture(&self, inbound: InboundRequest) -> Result<WebhookLog, CaptureFailure> {
        let mut log = WebhookLog::received(normalize(inbound), now());

        if let Err(error) = self.logs.insert(&log).await {
            error!(webhook_id = %log.id, error = %error, "Failed to store webhook log");
            if let Err(transition) = log.mark_failed(now()) {
                warn!(webhook_id = %log.id, error = %transition, "Could not mark webhook log failed");
            }
            return Err(CaptureFailure { record: log, error });
        }

        trigger::dispatch(self.trigger.clone(), log.clone());

        if let Err(error) = log.mark_processed(now()) {
            return Err(CaptureFailure { record: log, error });
        }

        if let Err(e) = self
            .logs
            .update_status(log.id, log.status, log.processed_at, log.updated_at)
            .await
        {
            warn!(webhook_id = %log.id, error = %e, "Failed to update webhook log status");
        }

        Ok(log)
    }
}

pub fn normalize(inbound: InboundRequest) -> NewWebhookLog {
    let user_agent = inbound
        .headers
        .get(USER_AGENT)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();

    let body = if inbound.method == Method::GET {
        query_payload(inbound.raw_query.as_deref().unwrap_or(""))
    } else {
        body_payload(&inbound.body)
    };

    NewWebhookLog {
        endpoint_id: inbound.endpoint_id,
        method: inbound.method.as_str().to_string(),
        headers: join_headers(&inbound.headers),
        body,
        ip_address: inbound.ip_address,
        user_agent,
    }
}

/// One string per header name; repeated headers are joined with ", ".
/// Distinct values cannot be recovered afterwards.
pub fn join_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), joined)
        })
        .collect()
}

/// Query map for GET calls: a key seen once maps to a string, a repeated key
/// maps to its values in order of occurrence.
pub fn query_payload(raw_query: &str) -> Payload {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(raw_query.as_bytes()) {
        grouped
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    if grouped.is_empty() {
        return Payload::Empty;
    }

    let map: Map<String, JsonValue> = grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                JsonValue::String(values.remove(0))
            } else {
                JsonValue::Array(values.into_iter().map(JsonValue::String).collect())
            };
            (key, value)
        })
        .collect();
    Payload::Json(JsonValue::Object(map))
}

/// JSON if it parses, the raw text if not, nothing for an empty body.
pub fn body_payload(body: &[u8]) -> Payload {
    if body.is_empty() {
        return Payload::Empty;
    }
    match serde_json::from_slice::<JsonValue>(body) {
        Ok(value) => Payload::Json(value),
        Err(_) => Payload::Raw(String::from_utf8_lossy(body).into_owned()),
    }
}
