//! Connection Supervisor
//!
//! Owns the connect/retry state machine for the document store:
//!
//! ```text
//!            failure: log, wait retry interval
//!              ┌─────────┐
//!              ▼         │
//!   start ─▶ CONNECTING ─┘ ──success──▶ CONNECTED
//!              ▲                           │
//!              └──── probe failure ────────┘   (only with a ping interval)
//!
//!   shutdown from any state ─▶ STOPPED
//! ```
//!
//! The retry interval is fixed. Without a ping interval CONNECTED is
//! terminal and the store stays published for the life of the process.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::{StoreConfig, SupervisorConfig};
use crate::store::{StoreConnector, StoreHandle};

use super::availability::{self, AvailabilityPublisher, StoreGate};

/// Supervisor states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Connecting,
    Connected,
    Stopped,
}

/// Background task that establishes and publishes the store handle
pub struct ConnectionSupervisor {
    connector: Arc<dyn StoreConnector>,
    store_config: StoreConfig,
    config: SupervisorConfig,
    publisher: AvailabilityPublisher,
    gate: StoreGate,
}

impl ConnectionSupervisor {
    /// Create a supervisor. Nothing happens until [`Self::spawn`].
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        store_config: StoreConfig,
        config: SupervisorConfig,
    ) -> Self {
        let (publisher, gate) = availability::channel();
        Self {
            connector,
            store_config,
            config,
            publisher,
            gate,
        }
    }

    /// Read-only view of store availability
    pub fn gate(&self) -> StoreGate {
        self.gate.clone()
    }

    /// Run the state machine on a background task until `shutdown` fires.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            mode = %self.store_config.mode,
            url = %self.store_config.redacted_url(),
            retry_interval_ms = self.config.retry_interval_ms,
            "Connection supervisor starting"
        );

        let mut state = SupervisorState::Connecting;
        loop {
            debug!(?state, "Connection supervisor state");
            state = match state {
                SupervisorState::Connecting => match self.connect(&mut shutdown).await {
                    Some(store) => {
                        self.publisher.publish(store);
                        info!(database = %self.store_config.database, "MongoDB connected");
                        SupervisorState::Connected
                    }
                    None => SupervisorState::Stopped,
                },
                SupervisorState::Connected => self.hold(&mut shutdown).await,
                SupervisorState::Stopped => break,
            };
        }

        info!("Connection supervisor stopped");
    }

    /// CONNECTING: attempt until success. `None` means shutdown was requested.
    async fn connect(&self, shutdown: &mut broadcast::Receiver<()>) -> Option<StoreHandle> {
        let retry_interval = self.config.retry_interval();
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            let result = tokio::select! {
                result = self.connector.connect(&self.store_config) => result,
                _ = shutdown.recv() => return None,
            };

            match result {
                Ok(store) => return Some(store),
                Err(e) => {
                    error!(
                        attempt,
                        error = %e,
                        retry_in_ms = self.config.retry_interval_ms,
                        "Store connection failed"
                    );
                }
            }

            tokio::select! {
                _ = time::sleep(retry_interval) => {}
                _ = shutdown.recv() => return None,
            }
        }
    }

    /// CONNECTED: wait for shutdown, probing the store if a ping interval is set.
    async fn hold(&self, shutdown: &mut broadcast::Receiver<()>) -> SupervisorState {
        let Some(ping_interval) = self.config.ping_interval() else {
            let _ = shutdown.recv().await;
            return SupervisorState::Stopped;
        };
        let Some(store) = self.gate.guard() else {
            return SupervisorState::Connecting;
        };

        let mut ticker = time::interval_at(Instant::now() + ping_interval, ping_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = store.ping().await {
                        error!(error = %e, "Store liveness probe failed, reconnecting");
                        self.publisher.withdraw();
                        return SupervisorState::Connecting;
                    }
                }
                _ = shutdown.recv() => return SupervisorState::Stopped,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionMode;
    use crate::store::{MemoryConnector, MemoryStore};
    use std::time::Duration;

    fn supervisor(connector: Arc<MemoryConnector>, retry_ms: u64) -> ConnectionSupervisor {
        ConnectionSupervisor::new(
            connector,
            StoreConfig::new(ConnectionMode::Plain),
            SupervisorConfig {
                retry_interval_ms: retry_ms,
                ping_interval_ms: 0,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_on_first_attempt() {
        let connector = Arc::new(MemoryConnector::new(Arc::new(MemoryStore::default())));
        let supervisor = supervisor(connector.clone(), 2000);
        let gate = supervisor.gate();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = supervisor.spawn(shutdown_rx);
        assert!(gate.available().await.is_some());
        assert_eq!(connector.attempt_count(), 1);

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_retrying() {
        let connector = Arc::new(
            MemoryConnector::new(Arc::new(MemoryStore::default())).failing_first(usize::MAX),
        );
        let supervisor = supervisor(connector.clone(), 1000);
        let gate = supervisor.gate();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = supervisor.spawn(shutdown_rx);
        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(connector.attempt_count(), 3);

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(connector.attempt_count(), 3);
        assert!(!gate.is_available());
    }
}
