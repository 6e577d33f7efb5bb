pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::services::{
    capture_service::CaptureService, log_service::WebhookLogService, log_store::WebhookLogStore,
    replay_service::ReplayService, trigger::ActionTrigger,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub log_service: WebhookLogService,
    pub capture_service: CaptureService,
    pub replay_service: ReplayService,
}

impl AppState {
    pub fn new(
        config: &Config,
        store: Arc<dyn WebhookLogStore>,
        trigger: Arc<dyn ActionTrigger>,
    ) -> Self {
        let log_service = WebhookLogService::new(store);
        let capture_service = CaptureService::new(log_service.clone(), trigger);
        let replay_service =
            ReplayService::new(log_service.clone(), config.replay_default_timeout_secs);

        Self {
            log_service,
            capture_service,
            replay_service,
        }
    }
}
