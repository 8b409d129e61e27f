//! Product Store
//!
//! The store handle is the single logical connection to the backing document
//! store. Handlers reach it through the availability gate; the connection
//! supervisor creates it through a [`StoreConnector`].

pub mod memory;
pub mod mongo;

pub use memory::{MemoryConnector, MemoryStore};
pub use mongo::{MongoConnector, MongoStore};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::StoreConfig;

/// A product record as returned to clients. The service never inspects its shape.
pub type Product = serde_json::Value;

/// Shared handle to a connected store
pub type StoreHandle = Arc<dyn ProductStore>;

/// Errors that can occur when talking to the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Query failed: {0}")]
    Query(String),
}

/// Read operations against the product collection
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Every record in the collection
    async fn list_all(&self) -> Result<Vec<Product>, StoreError>;

    /// The record whose `sku` equals `sku` exactly
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError>;

    /// Records tagged with `category`, sorted by name ascending
    async fn find_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError>;

    /// Distinct category tags across all records
    async fn categories(&self) -> Result<Vec<serde_json::Value>, StoreError>;

    /// Text search over name and description
    async fn search(&self, text: &str) -> Result<Vec<Product>, StoreError>;

    /// Round-trip to the server to prove the connection is live
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Establishes store handles from connection settings
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Make one connection attempt. Succeeds only once the store has answered.
    async fn connect(&self, config: &StoreConfig) -> Result<StoreHandle, StoreError>;
}
