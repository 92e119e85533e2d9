//! Process lifecycle
//!
//! Serves the router until SIGTERM/SIGINT, then stops the background
//! workers so in-flight turns can finish.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::worker::BackgroundHandle;

/// Returns a token cancelled on SIGINT (Ctrl+C) or SIGTERM
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("🛑 Received SIGINT, shutting down"),
            _ = terminate => tracing::info!("🛑 Received SIGTERM, shutting down"),
        }
        trigger.cancel();
    });

    token
}

/// HTTP router plus the background tasks that live and die with it
pub struct SitelineService {
    router: Router,
    background: Vec<BackgroundHandle>,
    shutdown: CancellationToken,
}

impl SitelineService {
    pub fn new(
        router: Router,
        background: Vec<BackgroundHandle>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            router,
            background,
            shutdown,
        }
    }

    /// Serve until the shutdown token fires, then stop every background task
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let shutdown = self.shutdown.clone();
        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;

        tracing::info!("Stopping {} background tasks", self.background.len());
        for handle in self.background {
            handle.stop().await;
        }
        tracing::info!("👋 Siteline API stopped");

        served
    }
}

#[shuttle_runtime::async_trait]
impl shuttle_runtime::Service for SitelineService {
    async fn bind(self, addr: SocketAddr) -> Result<(), shuttle_runtime::Error> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}"))?;
        self.serve(listener)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {e}"))?;
        Ok(())
    }
}
