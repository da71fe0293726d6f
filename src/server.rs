use crate::domain::repositories::FeedbackProvider;
use crate::interface::middleware::apply_layers;
use crate::interface::routers::create_feedback_router;
use axum::Router;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinError;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to start server on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("server failed: {0}")]
    Serve(#[from] io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] JoinError),
}

/// Everything the HTTP server needs, fixed at construction.
#[derive(Clone, TypedBuilder)]
pub struct ServerConfig {
    #[builder(default = "localhost".to_string(), setter(into))]
    host: String,
    #[builder(default = 8080)]
    port: u16,
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    request_timeout: Duration,
    #[builder(default = DEFAULT_SHUTDOWN_TIMEOUT)]
    shutdown_timeout: Duration,
    provider: Arc<dyn FeedbackProvider>,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct HttpServer {
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn router(&self) -> Router {
        apply_layers(
            create_feedback_router(self.config.provider.clone()),
            self.config.request_timeout,
        )
    }

    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = self.config.address();
        info!("Binding to {address}");

        TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })
    }

    /// Serves requests until `signal` resolves, then stops accepting
    /// connections and waits up to the shutdown timeout for in-flight requests.
    /// Requests still running after that are abandoned. The provider is closed
    /// in every case.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match listener.local_addr() {
            Ok(address) => info!("Server running on {address}"),
            Err(e) => warn!("Server running on unknown address: {:?}", e),
        }

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let app = self.router();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = drain_rx.await;
                })
                .await
        });

        let result = tokio::select! {
            joined = &mut server => {
                warn!("Server stopped without a shutdown signal");
                flatten(joined)
            }
            () = signal => {
                info!("Server shutting down...");
                let _ = drain_tx.send(());
                match tokio::time::timeout(self.config.shutdown_timeout, &mut server).await {
                    Ok(joined) => flatten(joined),
                    Err(_) => {
                        warn!(
                            timeout = ?self.config.shutdown_timeout,
                            "In-flight requests did not finish in time, abandoning them"
                        );
                        server.abort();
                        Ok(())
                    }
                }
            }
        };

        self.config.provider.close().await;
        info!("Server stopped");

        result
    }
}

fn flatten(joined: Result<io::Result<()>, JoinError>) -> Result<(), ServerError> {
    Ok(joined??)
}
