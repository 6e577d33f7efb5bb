use hookwatch::{
    config::{get_config, init_config, LogFormat, StorageBackend},
    database::pool::{create_pool, run_migrations},
    routes,
    services::{
        log_store::{PgWebhookLogStore, WebhookLogStore},
        memory_store::MemoryWebhookLogStore,
        trigger::LoggingTrigger,
    },
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let store: Arc<dyn WebhookLogStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = create_pool(config).await?;
            run_migrations(&pool).await?;
            info!("Connected to Postgres");
            Arc::new(PgWebhookLogStore::new(pool))
        }
        StorageBackend::Memory => {
            info!("Using in-memory webhook log store; records are lost on restart");
            Arc::new(MemoryWebhookLogStore::new())
        }
    };

    let app_state = AppState::new(config, store, Arc::new(LoggingTrigger));
    let app = routes::app(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Starting HookWatch on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
