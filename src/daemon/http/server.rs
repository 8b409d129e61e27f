//! HTTP API Server
//!
//! Axum-based HTTP server for the catalogue API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

use crate::config::HttpConfig;

use super::handlers::AppState;
use super::routes::create_router;

/// HTTP API server bound to its listen address
pub struct HttpServer {
    listener: TcpListener,
    state: AppState,
}

impl HttpServer {
    /// Bind the listener. Requests are not served until [`Self::run`].
    pub async fn bind(config: &HttpConfig, state: AppState) -> Result<Self> {
        let addr: SocketAddr = config
            .listen_addr()
            .parse()
            .context("Invalid HTTP listen address")?;

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;

        Ok(Self { listener, state })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read HTTP listen address")
    }

    /// Run the HTTP server until `shutdown` fires
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let app = create_router(self.state);

        info!("Started on port {}", self.listener.local_addr()?.port());

        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::availability;

    #[test]
    fn test_parse_listen_addr() {
        let config = HttpConfig::default();
        let addr: SocketAddr = config.listen_addr().parse().unwrap();
        assert_eq!(addr.port(), 8080);

        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(addr.port(), 9000);
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let (_publisher, gate) = availability::channel();
        let config = HttpConfig {
            listen_host: "127.0.0.1".to_string(),
            port: 0,
            sku_delay_ms: 0,
        };
        let server = HttpServer::bind(&config, AppState::new(gate)).await.unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_host() {
        let (_publisher, gate) = availability::channel();
        let config = HttpConfig {
            listen_host: "not a host".to_string(),
            ..HttpConfig::default()
        };
        assert!(HttpServer::bind(&config, AppState::new(gate)).await.is_err());
    }
}
