//! Service Daemon
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      catalogue service                       │
//! │                                                              │
//! │  ┌──────────────────────┐        ┌────────────────────────┐  │
//! │  │ Connection Supervisor│──────▶ │ Availability           │  │
//! │  │ connect / retry /    │publish │ (store handle or none) │  │
//! │  │ optional probe       │        └───────────┬────────────┘  │
//! │  └──────────┬───────────┘                    │ gate          │
//! │             │ connect                        ▼               │
//! │  ┌──────────▼───────────┐        ┌────────────────────────┐  │
//! │  │ Store (MongoDB)      │◀────── │ HTTP API (axum)        │◀─── clients
//! │  └──────────────────────┘ query  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The HTTP listener starts immediately and independently of the store
//! connection. Until the supervisor publishes a store, every store-backed
//! route answers `500 Database not available`.

pub mod availability;
pub mod http;
pub mod lifecycle;
pub mod supervisor;

pub use availability::{AvailabilityPublisher, StoreGate};
pub use http::HttpServer;
pub use lifecycle::Service;
pub use supervisor::{ConnectionSupervisor, SupervisorState};
