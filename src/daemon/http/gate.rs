//! Availability gate extractor
//!
//! Store-backed handlers take an [`AvailableStore`] argument. Extraction
//! fails with [`Unavailable`] when no store is published, so the handler
//! body never runs and no store operation is attempted.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::store::StoreHandle;

use super::handlers::AppState;

/// Body returned while the store is unavailable
pub const UNAVAILABLE_MESSAGE: &str = "Database not available";

/// A store handle that passed the availability gate
pub struct AvailableStore(pub StoreHandle);

/// Rejection produced while the store is unavailable
#[derive(Debug)]
pub struct Unavailable;

impl IntoResponse for Unavailable {
    fn into_response(self) -> Response {
        error!("{}", UNAVAILABLE_MESSAGE);
        (StatusCode::INTERNAL_SERVER_ERROR, UNAVAILABLE_MESSAGE).into_response()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AvailableStore {
    type Rejection = Unavailable;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state.gate.guard().map(AvailableStore).ok_or(Unavailable)
    }
}
