//! Service Lifecycle Management
//!
//! Wires the connection supervisor and HTTP server together and handles
//! graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::store::StoreConnector;

use super::availability::StoreGate;
use super::http::{AppState, HttpServer};
use super::supervisor::ConnectionSupervisor;

/// How long each task gets to stop before it is aborted
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Running catalogue service
pub struct Service {
    gate: StoreGate,
    supervisor: JoinHandle<()>,
    server: HttpServer,
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl Service {
    /// Start the service: begin connecting to the store in the background and
    /// bind the HTTP listener. The listener is bound before the store is
    /// reachable; requests are gated until it is.
    pub async fn start(config: Config, connector: Arc<dyn StoreConnector>) -> Result<Self> {
        info!("Starting catalogue service");

        let (shutdown_tx, shutdown_rx) = broadcast::channel(16);

        let supervisor =
            ConnectionSupervisor::new(connector, config.store.clone(), config.supervisor.clone());
        let gate = supervisor.gate();

        let state = AppState::new(gate.clone()).with_sku_delay(config.http.sku_delay());
        let server = HttpServer::bind(&config.http, state).await?;
        let local_addr = server.local_addr()?;

        let supervisor = supervisor.spawn(shutdown_tx.subscribe());

        Ok(Self {
            gate,
            supervisor,
            server,
            local_addr,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Read-only view of store availability
    pub fn gate(&self) -> StoreGate {
        self.gate.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Sender that stops the service when signalled
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Serve until Ctrl+C, SIGTERM, a programmatic shutdown, or an HTTP
    /// server failure.
    ///
    /// A shutdown sent through [`Self::shutdown_handle`] before `run` is
    /// called is still observed.
    pub async fn run(self) -> Result<()> {
        let Self {
            supervisor,
            server,
            shutdown_tx,
            shutdown_rx,
            ..
        } = self;

        let http_rx = shutdown_tx.subscribe();
        let mut http = tokio::spawn(server.run(http_rx));

        let http_exit = tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                None
            }
            _ = wait_for_sigterm() => {
                info!("Received SIGTERM, shutting down");
                None
            }
            _ = wait_for_shutdown(shutdown_rx) => {
                info!("Shutdown requested");
                None
            }
            joined = &mut http => Some(joined),
        };

        let _ = shutdown_tx.send(());

        let result = match http_exit {
            None => {
                if let Some(Err(e)) = stop_task("HTTP server", http).await {
                    error!("HTTP server failed: {:#}", e);
                }
                Ok(())
            }
            Some(Ok(Ok(()))) => {
                info!("HTTP server shut down cleanly");
                Ok(())
            }
            Some(Ok(Err(e))) => {
                error!("HTTP server failed: {:#}", e);
                Err(e)
            }
            Some(Err(e)) => {
                error!("HTTP server task panicked: {}", e);
                Err(anyhow!("HTTP server task failed: {}", e))
            }
        };

        stop_task("Connection supervisor", supervisor).await;

        info!("Catalogue service stopped");
        result
    }
}

/// Wait for a task to finish, aborting it after the grace period. Returns the
/// task's output if it finished in time.
async fn stop_task<T>(name: &str, task: JoinHandle<T>) -> Option<T> {
    let abort = task.abort_handle();
    match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
        Ok(Ok(output)) => Some(output),
        Ok(Err(e)) => {
            error!("{} task failed: {}", name, e);
            None
        }
        Err(_) => {
            warn!("{} did not shut down within {:?}, aborting", name, SHUTDOWN_GRACE);
            abort.abort();
            None
        }
    }
}

/// Wait for SIGTERM signal
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}. Falling back to pending future.", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}

/// Wait for shutdown signal from broadcast channel
async fn wait_for_shutdown(mut rx: broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}
