//! Connection supervisor tests
//!
//! Run on paused tokio time so retry and probe intervals are exact.

use std::sync::Arc;
use std::time::Duration;

use catalogue::config::{ConnectionMode, StoreConfig, SupervisorConfig};
use catalogue::daemon::ConnectionSupervisor;
use catalogue::store::{MemoryConnector, MemoryStore};
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};

const RETRY: Duration = Duration::from_millis(2000);

fn supervisor(connector: &Arc<MemoryConnector>, ping_interval_ms: u64) -> ConnectionSupervisor {
    ConnectionSupervisor::new(
        connector.clone(),
        StoreConfig::new(ConnectionMode::Plain),
        SupervisorConfig {
            retry_interval_ms: RETRY.as_millis() as u64,
            ping_interval_ms,
        },
    )
}

#[tokio::test(start_paused = true)]
async fn test_flag_false_until_first_success_then_latched() {
    let store = Arc::new(MemoryStore::default());
    let connector = Arc::new(MemoryConnector::new(store.clone()).failing_first(3));
    let supervisor = supervisor(&connector, 0);
    let gate = supervisor.gate();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    assert!(!gate.is_available());
    let start = Instant::now();
    let task = supervisor.spawn(shutdown_rx);

    // Failed attempts at 0s, 2s, 4s; success at 6s.
    sleep(Duration::from_millis(5900)).await;
    assert!(!gate.is_available());
    assert_eq!(connector.attempt_count(), 3);

    let handle = gate.available().await;
    assert!(handle.is_some());
    assert_eq!(start.elapsed(), RETRY * 3);
    assert_eq!(connector.attempt_count(), 4);

    // Latched: a store that stops answering is not noticed without a probe.
    store.set_unreachable(true);
    sleep(Duration::from_secs(600)).await;
    assert!(gate.is_available());
    assert_eq!(connector.attempt_count(), 4);

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_retry_interval_is_fixed() {
    let connector = Arc::new(
        MemoryConnector::new(Arc::new(MemoryStore::default())).failing_first(5),
    );
    let supervisor = supervisor(&connector, 0);
    let gate = supervisor.gate();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let task = supervisor.spawn(shutdown_rx);
    gate.available().await;

    let attempts = connector.attempts();
    assert_eq!(attempts.len(), 6);
    for pair in attempts.windows(2) {
        assert_eq!(pair[1] - pair[0], RETRY);
    }

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_probe_withdraws_and_reconnects() {
    let store = Arc::new(MemoryStore::default());
    let connector = Arc::new(MemoryConnector::new(store.clone()));
    let supervisor = supervisor(&connector, 1000);
    let gate = supervisor.gate();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let task = supervisor.spawn(shutdown_rx);
    gate.available().await;
    assert_eq!(connector.attempt_count(), 1);

    // Healthy probes keep the store published.
    sleep(Duration::from_millis(3500)).await;
    assert!(gate.is_available());
    assert_eq!(connector.attempt_count(), 1);

    store.set_unreachable(true);
    assert!(gate.unavailable().await);
    assert!(gate.guard().is_none());

    // Reconnect attempts fail while the store is unreachable.
    sleep(RETRY * 2).await;
    assert!(!gate.is_available());
    let failed_attempts = connector.attempt_count();
    assert!(failed_attempts >= 2);

    store.set_unreachable(false);
    gate.available().await;
    assert!(connector.attempt_count() > failed_attempts);

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_while_connected() {
    let connector = Arc::new(MemoryConnector::new(Arc::new(MemoryStore::default())));
    let supervisor = supervisor(&connector, 0);
    let gate = supervisor.gate();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let task = supervisor.spawn(shutdown_rx);
    gate.available().await;

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
    assert_eq!(connector.attempt_count(), 1);
}
