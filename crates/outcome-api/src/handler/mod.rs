//! HTTP handlers for the prediction server
//!
//! ## Architecture
//!
//! - `routes`: route table, handlers and the API error type
//! - `middleware`: request ids, request spans and request metrics
//!
//! All responses are JSON except `/metrics`, which uses the Prometheus text
//! format.

pub mod middleware;
pub mod routes;

pub use middleware::{current_request_id, request_context_middleware, REQUEST_ID_HEADER};
pub use routes::{
    create_router, health_check, metrics, predict, root, ApiError, AppState,
};

use outcome_core::PredictionLabel;
use serde::{Deserialize, Serialize};

pub const ROOT_MESSAGE: &str = "Student Dropout Prediction API is running!";

/// Body of a successful `POST /predict`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: PredictionLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_run: Option<String>,
    /// SHA-256 over the loaded artifact files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Process start (RFC 3339)
    pub started_at: String,
    pub uptime_seconds: u64,
}

/// Error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Envelope for every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}
