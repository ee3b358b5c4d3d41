//! Per-request webhook dispatch.
//!
//! # Responsibilities
//! - Reject anything but POST before reading the body
//! - Parse the body into a `WebhookRequest` and bind its context
//! - Run the route's handler and write the serialized response
//!
//! # Design Decisions
//! - A failed request never produces a partial body: 400 for unparseable
//!   input, 500 for handler or serialization failures, both empty
//! - Every outcome is counted under the route pattern, not the raw path,
//!   so metric cardinality stays bounded

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{Instrument, Span};

use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::webhook::{Handler, RequestContext, WebhookRequest, WebhookResponse};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// State bound to one registered route.
#[derive(Clone)]
pub(crate) struct RouteState {
    pub(crate) pattern: Arc<str>,
    pub(crate) handler: Arc<dyn Handler>,
    pub(crate) shutdown: ShutdownSignal,
    pub(crate) span: Span,
    pub(crate) max_body_bytes: usize,
}

/// Axum entry point for every registered route.
pub(crate) async fn dispatch(State(state): State<RouteState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let response = handle_webhook(&state, request).await;
    metrics::record_request(&state.pattern, response.status().as_u16(), start);
    response
}

/// Fallback for paths no route covers.
pub(crate) async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn handle_webhook(state: &RouteState, request: Request<Body>) -> Response {
    if request.method() != Method::POST {
        tracing::debug!(
            parent: &state.span,
            method = %request.method(),
            route = %state.pattern,
            "Rejecting non-POST webhook request"
        );
        return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "POST")]).into_response();
    }

    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span = tracing::info_span!(
        parent: &state.span,
        "webhook",
        request_id = %request_id,
        route = %state.pattern,
        session = tracing::field::Empty,
    );

    let body = match axum::body::to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(parent: &span, error = %e, "Failed to read webhook body");
            metrics::record_parse_error(&state.pattern);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let mut req = match WebhookRequest::parse(&body) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(parent: &span, error = %e, "Malformed webhook request");
            metrics::record_parse_error(&state.pattern);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    span.record("session", req.session_id());
    req.attach_context(RequestContext::new(
        request_id,
        span.clone(),
        state.shutdown.clone(),
    ));

    let mut res = WebhookResponse::from_request(&req);
    if let Err(e) = state
        .handler
        .handle(&mut res, &req)
        .instrument(span.clone())
        .await
    {
        tracing::error!(parent: &span, error = %e, "Webhook handler failed");
        metrics::record_handler_error(&state.pattern);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    match res.serialize() {
        Ok(bytes) => {
            tracing::debug!(parent: &span, bytes = bytes.len(), "Webhook response written");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(parent: &span, error = %e, "Failed to serialize webhook response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
