pub mod health;
pub mod webhook;

use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{middleware::cors::permissive_cors, AppState};

pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/webhooks/replay/:webhook_log_id", post(webhook::replay_webhook))
        .route("/webhooks/:endpoint_id/receive", any(webhook::receive_webhook))
        .route(
            "/webhooks/:endpoint_id/logs",
            get(webhook::list_webhook_logs).delete(webhook::clear_webhook_logs),
        )
        .with_state(state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
