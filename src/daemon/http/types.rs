//! HTTP API Response Types
//!
//! JSON-serializable types for the HTTP API. Product payloads are passed
//! through untouched, so only the envelope types live here.

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "OK" while the process is serving
    pub app: String,
    /// Whether the document store is currently available
    pub mongo: bool,
}

impl HealthResponse {
    pub fn new(store_available: bool) -> Self {
        Self {
            app: "OK".to_string(),
            mongo: store_available,
        }
    }
}

/// Error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::new("QUERY_FAILED", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_shape() {
        let json = serde_json::to_value(HealthResponse::new(false)).unwrap();
        assert_eq!(json, serde_json::json!({"app": "OK", "mongo": false}));
    }
}
