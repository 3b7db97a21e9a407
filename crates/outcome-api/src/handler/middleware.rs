//! Request middleware
//!
//! Every request gets an id, taken from an incoming `x-request-id` header or
//! generated as a UUID. The id is echoed on the response, attached to the
//! request span and made available to error responses through a task-local.

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;

use super::routes::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Id of the request being handled on this task, if any
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

fn incoming_request_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
}

/// Request id, span, logging and request metrics
pub async fn request_context_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let request_id =
        incoming_request_id(&request).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = request.method().clone();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        endpoint = %endpoint,
    );

    let start = Instant::now();
    let mut response = REQUEST_ID
        .scope(request_id.clone(), next.run(request))
        .instrument(span.clone())
        .await;
    let status = response.status();

    span.in_scope(|| {
        tracing::info!(
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
    });

    if let Some(metrics) = &state.metrics {
        metrics.record_request(&endpoint, status.as_u16());
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;

    #[test]
    fn test_incoming_request_id() {
        let request = http::Request::builder()
            .header(REQUEST_ID_HEADER, " abc-123 ")
            .body(Body::empty())
            .unwrap();
        assert_eq!(incoming_request_id(&request).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_oversized_request_id_ignored() {
        let request = http::Request::builder()
            .header(REQUEST_ID_HEADER, "x".repeat(MAX_REQUEST_ID_LEN + 1))
            .body(Body::empty())
            .unwrap();
        assert!(incoming_request_id(&request).is_none());
    }

    #[test]
    fn test_no_request_id_outside_scope() {
        assert!(current_request_id().is_none());
    }

    #[tokio::test]
    async fn test_request_id_inside_scope() {
        let id = REQUEST_ID
            .scope("req-1".to_string(), async { current_request_id() })
            .await;
        assert_eq!(id.as_deref(), Some("req-1"));
    }
}
