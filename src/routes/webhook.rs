use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, Method, Uri},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use std::net::SocketAddr;
use validator::Validate;

use crate::{
    dto::webhook_dto::{
        ClearLogsResponse, LogsQuery, LogsResponse, ReceiveResponse, ReplayPayload,
        ReplayResponse,
    },
    error::{Error, Result},
    services::capture_service::InboundRequest,
    utils::limits::clamp_log_limit,
    AppState,
};

pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(endpoint_id): Path<String>,
    peer: Option<ConnectInfo<SocketAddr>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let ip_address = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    let inbound = InboundRequest {
        endpoint_id,
        method,
        raw_query: uri.query().map(str::to_string),
        headers,
        body,
        ip_address,
    };

    let log = state
        .capture_service
        .capture(inbound)
        .await
        .map_err(|failure| failure.error.context("Failed to process webhook"))?;

    Ok(Json(ReceiveResponse::from(&log)))
}

pub async fn list_webhook_logs(
    State(state): State<AppState>,
    Path(endpoint_id): Path<String>,
    uri: Uri,
) -> Result<impl IntoResponse> {
    let query = LogsQuery::parse(uri.query());
    let limit = clamp_log_limit(query.limit.as_deref());
    let logs = state
        .log_service
        .list_by_endpoint(&endpoint_id, limit)
        .await
        .map_err(|e| e.context("Failed to retrieve webhook logs"))?;

    Ok(Json(LogsResponse {
        endpoint_id,
        count: logs.len(),
        logs,
        limit,
    }))
}

pub async fn clear_webhook_logs(
    State(state): State<AppState>,
    Path(endpoint_id): Path<String>,
) -> Result<impl IntoResponse> {
    if endpoint_id.trim().is_empty() {
        return Err(Error::BadRequest("Endpoint ID is required".into()));
    }

    let deleted_count = state
        .log_service
        .delete_by_endpoint(&endpoint_id)
        .await
        .map_err(|e| e.context("Failed to clear webhook logs"))?;

    Ok(Json(ClearLogsResponse {
        message: "Webhook logs cleared successfully",
        endpoint_id,
        deleted_count,
    }))
}

pub async fn replay_webhook(
    State(state): State<AppState>,
    Path(webhook_log_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    if webhook_log_id.trim().is_empty() {
        return Err(Error::BadRequest("Webhook log ID is required".into()));
    }

    let payload: ReplayPayload = serde_json::from_slice(&body)?;
    payload.validate()?;
    let target_url = payload.target_url.unwrap_or_default();

    let result = state
        .replay_service
        .replay_by_id(&webhook_log_id, &target_url, payload.timeout)
        .await
        .map_err(|e| e.context("Failed to replay webhook"))?;

    Ok(Json(ReplayResponse {
        message: "Webhook replayed successfully",
        webhook_log_id,
        target_url,
        result,
    }))
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}
