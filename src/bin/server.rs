use feedback_service::config::{AppConfig, StorageKind};
use feedback_service::domain::repositories::FeedbackProvider;
use feedback_service::infrastructure::memory::InMemoryFeedbackProvider;
use feedback_service::infrastructure::repositories_impl::MySqlFeedbackProvider;
use feedback_service::server::{HttpServer, ServerConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let start = Instant::now();
    info!("Starting application...");

    let config = AppConfig::from_env()?;

    let provider: Arc<dyn FeedbackProvider> = match config.storage() {
        StorageKind::MySql(options) => {
            let mysql = MySqlFeedbackProvider::connect(options).await?;
            if let Err(e) = mysql.create_table_if_not_exists().await {
                mysql.close().await;
                return Err(e.into());
            }
            Arc::new(mysql)
        }
        StorageKind::Memory => {
            info!("Using in-memory storage");
            Arc::new(InMemoryFeedbackProvider::new())
        }
    };

    let server = HttpServer::new(
        ServerConfig::builder()
            .host(config.host())
            .port(config.port())
            .provider(provider)
            .build(),
    );
    let listener = server.bind().await?;
    info!("Application started in {:?}", start.elapsed());

    server
        .serve(listener, feedback_service::util::shutdown_signal())
        .await?;

    Ok(())
}
