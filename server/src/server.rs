//! Server setup and lifecycle.

use config::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;

use crate::janitor::JanitorJob;
use crate::routes::create_router;
use crate::state::AppState;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error)
}

/// The commentary gateway HTTP server.
pub struct GatewayServer {
    config: ServerConfig,
    state: Arc<AppState>
}

impl GatewayServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state)
        }
    }

    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Runs the HTTP server and the janitor until a shutdown signal arrives.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source
            })?;

        let janitor = JanitorJob::new(
            self.state.pipeline.clone(),
            self.config.janitor_interval()
        )
        .start();

        tracing::info!(
            %addr,
            backend = self.state.pipeline.backend().name(),
            degraded = self.state.is_degraded(),
            "Commentary gateway listening"
        );

        let router = create_router(self.state.clone());
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>()
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        janitor.abort();
        tracing::info!("Commentary gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
