//! Catalogue: product lookup service backed by a document store
//!
//! Serves product records over HTTP. The store connection is owned by a
//! supervisor that retries on a fixed interval until it succeeds; requests
//! arriving before then are answered with a defined degraded response.

pub mod config;
pub mod daemon;
pub mod logging;
pub mod store;

pub use config::{Config, ConfigError};
pub use daemon::{ConnectionSupervisor, Service, StoreGate};
pub use store::{ProductStore, StoreConnector, StoreError};
