use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client, Method,
};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

use crate::dto::webhook_dto::ReplayResult;
use crate::error::{Error, Result};
use crate::models::webhook_log::WebhookLog;
use crate::services::log_service::WebhookLogService;
use crate::utils::time::timeout_or_default;

/// Framing and routing headers that belong to the original hop.
const SKIPPED_HEADERS: [&str; 4] = ["host", "content-length", "transfer-encoding", "connection"];

#[derive(Clone)]
pub struct ReplayService {
    client: Client,
    logs: WebhookLogService,
    default_timeout_secs: u64,
}

impl ReplayService {
    pub fn new(logs: WebhookLogService, default_timeout_secs: u64) -> Self {
        Self {
            client: Client::new(),
            logs,
            default_timeout_secs,
        }
    }

    /// Re-sends a stored call to `target_url`.
    ///
    /// Only a request that cannot be built (bad method, bad URL, unencodable
    /// body) is an `Err`. Anything that goes wrong on the wire comes back as
    /// a `ReplayResult` with `success == false`.
    pub async fn replay(
        &self,
        log: &WebhookLog,
        target_url: &str,
        timeout_secs: i64,
    ) -> Result<ReplayResult> {
        let started = Instant::now();
        let timeout = timeout_or_default(timeout_secs, self.default_timeout_secs);

        let method = Method::from_bytes(log.method.as_bytes())
            .map_err(|e| Error::BadRequest(format!("failed to create request: {}", e)))?;
        let url = Url::parse(target_url)
            .map_err(|e| Error::BadRequest(format!("failed to create request: {}", e)))?;
        let body = log.body.to_json_bytes()?;

        let mut headers = replay_headers(&log.headers);
        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let mut request = self
            .client
            .request(method, url)
            .headers(headers)
            .timeout(timeout);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(webhook_id = %log.id, target_url, error = %e, "Replay request failed");
                return Ok(ReplayResult::failed(e.to_string(), started.elapsed()));
            }
        };

        let status = response.status();
        let response_headers: HashMap<String, String> = response
            .headers()
            .keys()
            .filter_map(|name| {
                response.headers().get(name).map(|value| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
            })
            .collect();

        let response_body = match response.bytes().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                return Ok(ReplayResult::failed(
                    format!("failed to read response: {}", e),
                    started.elapsed(),
                ));
            }
        };

        let duration = started.elapsed();
        info!(
            webhook_id = %log.id,
            target_url,
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            "Replayed webhook"
        );

        Ok(ReplayResult {
            success: status.is_success(),
            status_code: Some(status.as_u16()),
            response_body: Some(response_body),
            response_headers,
            duration,
            error: None,
        })
    }

    /// Lookup errors (`InvalidId`, `NotFound`, store failures) are returned as
    /// `Err`; send errors are returned inside the `ReplayResult`.
    pub async fn replay_by_id(
        &self,
        log_id: &str,
        target_url: &str,
        timeout_secs: i64,
    ) -> Result<ReplayResult> {
        let log = self.logs.get_by_id(log_id).await?;
        self.replay(&log, target_url, timeout_secs).await
    }
}

/// Captured headers as an outbound header map. Names or values that are not
/// valid on the wire are dropped.
fn replay_headers(captured: &HashMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in captured {
        if SKIPPED_HEADERS
            .iter()
            .any(|skipped| name.eq_ignore_ascii_case(skipped))
        {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping header that cannot be replayed"),
        }
    }
    headers
}
