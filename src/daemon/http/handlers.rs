//! HTTP API Request Handlers
//!
//! Each store-backed handler passes the availability gate, issues exactly
//! one store query, and maps the result to a response.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, info};

use crate::daemon::availability::StoreGate;
use crate::store::StoreError;

use super::gate::AvailableStore;
use super::types::{ErrorResponse, HealthResponse};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Read side of store availability
    pub gate: StoreGate,
    /// Artificial delay before by-SKU lookups
    pub sku_delay: Duration,
}

impl AppState {
    pub fn new(gate: StoreGate) -> Self {
        Self {
            gate,
            sku_delay: Duration::ZERO,
        }
    }

    pub fn with_sku_delay(mut self, delay: Duration) -> Self {
        self.sku_delay = delay;
        self
    }
}

fn query_failed(e: StoreError) -> Response {
    error!(error = %e, "Store query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::query_failed(e.to_string())),
    )
        .into_response()
}

/// Health check endpoint. Reads cached availability only.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.gate.is_available()))
}

/// All products
pub async fn list_products(AvailableStore(store): AvailableStore) -> Response {
    match store.list_all().await {
        Ok(products) => Json(products).into_response(),
        Err(e) => query_failed(e),
    }
}

/// Product by SKU
pub async fn product_by_sku(
    AvailableStore(store): AvailableStore,
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Response {
    if !state.sku_delay.is_zero() {
        tokio::time::sleep(state.sku_delay).await;
    }

    match store.find_by_sku(&sku).await {
        Ok(Some(product)) => {
            info!(sku = %sku, "product found");
            Json(product).into_response()
        }
        Ok(None) => {
            info!(sku = %sku, "product not found");
            (StatusCode::NOT_FOUND, "SKU not found").into_response()
        }
        Err(e) => query_failed(e),
    }
}

/// Products in a category, sorted by name. An unknown category is an empty list.
pub async fn products_by_category(
    AvailableStore(store): AvailableStore,
    Path(category): Path<String>,
) -> Response {
    match store.find_by_category(&category).await {
        Ok(products) => {
            debug!(category = %category, count = products.len(), "category lookup");
            Json(products).into_response()
        }
        Err(e) => query_failed(e),
    }
}

/// Distinct categories
pub async fn categories(AvailableStore(store): AvailableStore) -> Response {
    match store.categories().await {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => query_failed(e),
    }
}

/// Text search over name and description
pub async fn search(
    AvailableStore(store): AvailableStore,
    Path(text): Path<String>,
) -> Response {
    match store.search(&text).await {
        Ok(hits) => {
            debug!(text = %text, hits = hits.len(), "search");
            Json(hits).into_response()
        }
        Err(e) => query_failed(e),
    }
}

/// Fallback for unmatched routes
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
