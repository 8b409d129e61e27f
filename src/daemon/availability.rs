//! Store Availability
//!
//! Availability is not a free-standing flag: it is the presence of a
//! published store handle. The connection supervisor owns the only
//! [`AvailabilityPublisher`]; everything else holds a [`StoreGate`] and can
//! only read.

use tokio::sync::watch;

use crate::store::StoreHandle;

/// Create a publisher/gate pair with the store initially unavailable.
pub fn channel() -> (AvailabilityPublisher, StoreGate) {
    let (tx, rx) = watch::channel(None);
    (AvailabilityPublisher { tx }, StoreGate { rx })
}

/// Write side of the availability state
pub struct AvailabilityPublisher {
    tx: watch::Sender<Option<StoreHandle>>,
}

impl AvailabilityPublisher {
    /// Publish a freshly connected store; the store becomes available
    pub fn publish(&self, store: StoreHandle) {
        self.tx.send_replace(Some(store));
    }

    /// Withdraw the current store; returns it if one was published
    pub fn withdraw(&self) -> Option<StoreHandle> {
        self.tx.send_replace(None)
    }

    /// A new read-only view of this state
    pub fn gate(&self) -> StoreGate {
        StoreGate {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the availability state, consulted before any store access
#[derive(Clone)]
pub struct StoreGate {
    rx: watch::Receiver<Option<StoreHandle>>,
}

impl StoreGate {
    /// The store handle if it is available, otherwise `None`.
    ///
    /// The returned handle is a snapshot: a handler that got one keeps
    /// using the same connection for the rest of the request.
    pub fn guard(&self) -> Option<StoreHandle> {
        self.rx.borrow().clone()
    }

    pub fn is_available(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait until a store is published. Returns `None` if the publisher is gone.
    pub async fn available(&self) -> Option<StoreHandle> {
        let mut rx = self.rx.clone();
        let result = rx.wait_for(Option::is_some).await;
        result.ok().and_then(|store| store.clone())
    }

    /// Wait until the store is withdrawn. Returns `false` if the publisher is gone.
    pub async fn unavailable(&self) -> bool {
        let mut rx = self.rx.clone();
        let result = rx.wait_for(Option::is_none).await;
        result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_starts_unavailable() {
        let (_publisher, gate) = channel();
        assert!(!gate.is_available());
        assert!(gate.guard().is_none());
    }

    #[test]
    fn test_publish_and_withdraw() {
        let (publisher, gate) = channel();
        let other = publisher.gate();

        publisher.publish(Arc::new(MemoryStore::default()));
        assert!(gate.is_available());
        assert!(other.guard().is_some());

        assert!(publisher.withdraw().is_some());
        assert!(!gate.is_available());
        assert!(publisher.withdraw().is_none());
    }

    #[tokio::test]
    async fn test_wait_for_availability() {
        let (publisher, gate) = channel();
        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.available().await.is_some() }
        });

        publisher.publish(Arc::new(MemoryStore::default()));
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_ends_when_publisher_dropped() {
        let (publisher, gate) = channel();
        drop(publisher);
        assert!(gate.available().await.is_none());
    }
}
