//! HTTP API Route Definitions
//!
//! Routes plus the dispatcher layers applied to every request: a
//! correlation id, a tracing span, and the uniform response headers.

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Request},
    routing::get,
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use super::handlers::{self, AppState};

/// Correlation id header, taken from the request or generated
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub const TIMING_ALLOW_ORIGIN: HeaderName = HeaderName::from_static("timing-allow-origin");

/// Create the API router with all routes and dispatcher layers
pub fn create_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        )
    });

    Router::new()
        .route("/health", get(handlers::health))
        .route("/products", get(handlers::list_products))
        .route("/product/:sku", get(handlers::product_by_sku))
        .route("/products/:cat", get(handlers::products_by_category))
        .route("/categories", get(handlers::categories))
        .route("/search/:text", get(handlers::search))
        .fallback(handlers::not_found)
        .with_state(state)
        // Layers run outermost-last: the id is set before the span is made
        // and copied onto the response after the headers are stamped.
        .layer(SetResponseHeaderLayer::overriding(
            TIMING_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(trace)
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
}
