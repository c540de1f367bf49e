//! # Request/Response Logging Middleware
//!
//! Structured logging for every HTTP request: method, path, status, duration,
//! correlated by the request ID from [`mw_req_stamp`](super::mw_req_stamp).

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Endpoints whose query strings may carry credentials and are not logged.
const SENSITIVE_ENDPOINTS: &[&str] = &["/api/auth/login", "/api/auth/signup", "/api/ws/chat"];

/// Request/response logging middleware.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let is_sensitive = SENSITIVE_ENDPOINTS.iter().any(|ep| path.starts_with(ep));
    let query = if is_sensitive {
        None
    } else {
        req.uri().query().map(|q| q.to_string())
    };

    let request_id = req
        .extensions()
        .get::<super::mw_req_stamp::RequestStamp>()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let res = next.run(req).await;

    let status = res.status();
    let duration_ms = start.elapsed().as_millis();

    if status.is_server_error() {
        warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            query = ?query,
            status = %status,
            duration_ms,
            "request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            query = ?query,
            status = %status,
            duration_ms,
            "request completed"
        );
    }

    res
}
