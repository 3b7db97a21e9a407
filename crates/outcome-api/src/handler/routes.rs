//! Route definitions for the prediction server
//!
//! - GET / - liveness message
//! - POST /predict - classify one student record
//! - GET /health - model and process status
//! - GET /metrics - Prometheus exposition (404 when metrics are disabled)

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use outcome_core::{FieldViolation, OutcomeError, PredictionService};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use super::middleware::{current_request_id, request_context_middleware};
use super::{ErrorBody, ErrorInfo, HealthResponse, PredictResponse, RootResponse, ROOT_MESSAGE};
use crate::telemetry::ServiceMetrics;

/// State shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    /// `None` when metrics are disabled
    pub metrics: Option<Arc<ServiceMetrics>>,
    /// Start time for uptime calculation
    pub start_time: Instant,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>, metrics: Option<Arc<ServiceMetrics>>) -> Self {
        if let (Some(metrics), Some(summary)) = (&metrics, service.summary()) {
            metrics.set_model_info(&summary.training_run, &summary.model_kind);
        }

        Self {
            service,
            metrics,
            start_time: Instant::now(),
            started_at: chrono::Utc::now(),
        }
    }
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    PayloadTooLarge(String),
    ValidationFailed(Vec<FieldViolation>),
    PipelineFailed(String),
    NotFound(String),
    InternalError(String),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApiError::PipelineFailed(_) => "PIPELINE_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::PipelineFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OutcomeError> for ApiError {
    fn from(err: OutcomeError) -> Self {
        match err {
            OutcomeError::Validation(violations) => ApiError::ValidationFailed(violations),
            OutcomeError::Pipeline(msg) => ApiError::PipelineFailed(msg),
            other => {
                tracing::error!(error = %other, "Prediction failed");
                ApiError::InternalError("Prediction failed due to an internal error".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match &self {
            ApiError::ValidationFailed(violations) => {
                ErrorInfo::new(self.error_code(), "Record validation failed")
                    .with_details(serde_json::json!({ "violations": violations }))
            }
            ApiError::BadRequest(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::PipelineFailed(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalError(msg) => ErrorInfo::new(self.error_code(), msg),
        };

        if status.is_client_error() {
            tracing::warn!(code = self.error_code(), message = %error.message, "Request rejected");
        }

        let body = ErrorBody {
            error,
            request_id: current_request_id(),
        };
        (status, Json(body)).into_response()
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: ROOT_MESSAGE.to_string(),
    })
}

/// POST /predict - Classify one student record
///
/// The body must be a JSON object carrying all 36 record fields.
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(record) = body?;

    let result = {
        let _timer = state.metrics.as_ref().map(|m| m.start_timer());
        state.service.predict_json(&record)
    };

    match result {
        Ok(prediction) => {
            if let Some(metrics) = &state.metrics {
                metrics.record_prediction(prediction.label.as_str());
            }
            tracing::debug!(label = %prediction.label, "Prediction returned");
            Ok(Json(PredictResponse {
                prediction: prediction.label,
            }))
        }
        Err(err) => {
            if let (Some(metrics), OutcomeError::Validation(violations)) = (&state.metrics, &err) {
                for violation in violations {
                    metrics.record_validation_failure(&violation.code);
                }
            }
            Err(err.into())
        }
    }
}

/// GET /health - Model and process status
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let summary = state.service.summary();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_kind: state.service.model_kind().to_string(),
        training_run: summary.map(|s| s.training_run.clone()),
        fingerprint: summary.map(|s| s.fingerprint.clone()),
        started_at: state.started_at.to_rfc3339(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let metrics = state
        .metrics
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("Metrics are disabled".to_string()))?;

    let body = metrics
        .gather()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
