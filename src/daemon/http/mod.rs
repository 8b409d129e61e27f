//! HTTP API Server Module
//!
//! Serves the product catalogue over HTTP. Every store-backed route goes
//! through the availability gate before touching the store.

pub mod gate;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use server::HttpServer;
