use crate::interface::payloads::ErrorBody;
use axum::body::Body;
use axum::http::{HeaderName, Request, StatusCode};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use std::time::Duration;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{info_span, Level, Span};

pub const HEADER_REQUEST_ID: &str = "x-request-id";

fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(HEADER_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id,
    )
}

async fn render_timeout(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }

    tracing::warn!(status = %StatusCode::REQUEST_TIMEOUT, "Request timed out");
    let body = ErrorBody {
        status_code: StatusCode::REQUEST_TIMEOUT.as_u16(),
        reason: "Request timed out".to_string(),
    };
    (StatusCode::REQUEST_TIMEOUT, Json(body)).into_response()
}

/// Wraps the router with request ids, per-request tracing and a timeout.
/// Timed-out requests get a 408 with the usual JSON error body.
pub fn apply_layers(router: Router, request_timeout: Duration) -> Router {
    let request_id = HeaderName::from_static(HEADER_REQUEST_ID);

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(map_response(render_timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_request_span)
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}
