use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::models::webhook_log::WebhookLog;

/// Post-capture side effects (notifications, forwarding, transformations).
///
/// Runs detached from the request that captured the call. Its outcome is
/// logged and otherwise discarded; it never changes the record's status.
#[async_trait]
pub trait ActionTrigger: Send + Sync {
    async fn trigger(&self, log: &WebhookLog) -> anyhow::Result<()>;
}

/// Default trigger: records that the call went through.
#[derive(Debug, Default, Clone)]
pub struct LoggingTrigger;

#[async_trait]
impl ActionTrigger for LoggingTrigger {
    async fn trigger(&self, log: &WebhookLog) -> anyhow::Result<()> {
        info!(
            webhook_id = %log.id,
            endpoint_id = %log.endpoint_id,
            "Webhook processed successfully"
        );
        Ok(())
    }
}

/// Spawns the trigger on its own task. The record is owned by the task, so
/// it sees the state at dispatch time and may outlive the HTTP response.
pub fn dispatch(trigger: Arc<dyn ActionTrigger>, log: WebhookLog) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(webhook_id = %log.id, "Triggering actions");
        if let Err(e) = trigger.trigger(&log).await {
            warn!(webhook_id = %log.id, error = ?e, "Action trigger failed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::webhook_log::{NewWebhookLog, Payload};
    use std::collections::HashMap;

    struct Failing;

    #[async_trait]
    impl ActionTrigger for Failing {
        async fn trigger(&self, _log: &WebhookLog) -> anyhow::Result<()> {
            anyhow::bail!("downstream unavailable")
        }
    }

    #[tokio::test]
    async fn trigger_failures_are_swallowed() {
        let log = WebhookLog::received(
            NewWebhookLog {
                endpoint_id: "orders".into(),
                method: "POST".into(),
                headers: HashMap::new(),
                body: Payload::Empty,
                ip_address: String::new(),
                user_agent: String::new(),
            },
            chrono::Utc::now(),
        );
        dispatch(Arc::new(Failing), log).await.expect("task completes");
    }
}
