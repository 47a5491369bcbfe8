//! Request-id tagging and latency logging for every HTTP request.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn request_logger_middleware(mut req: Request<Body>, next: Next<Body>) -> Response {
    // Honor an upstream request id (the transport sidecar sets one); mint
    // our own otherwise.
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    if let Ok(value) = request_id.parse() {
        req.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    // Health probes are frequent and boring; keep them out of the info log.
    let probe = uri.path() == "/health" || uri.path() == "/status";
    if !probe {
        tracing::info!(request_id = %request_id, method = %method, uri = %uri, "request received");
    }

    let mut response: Response = next.run(req).await;

    if !probe {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %response.status().as_u16(),
            latency_ms = %start.elapsed().as_millis(),
            "request completed"
        );
    }

    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
