//! Request logging middleware.
//!
//! One line per HTTP request with method, path, status, caller and latency.

use crate::auth::models::AuthContext;
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Log every request except `/health`.
///
/// Runs outside the token filter; the caller is read from the response,
/// where `auth_middleware` leaves a copy of the context.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Skip health checks to reduce noise
    if path == "/health" {
        return next.run(request).await;
    }

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("http_request", %request_id, method = %method, path = %path);
    let start = Instant::now();

    let response = next.run(request).instrument(span.clone()).await;

    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();
    let caller = response
        .extensions()
        .get::<AuthContext>()
        .map(|ctx| ctx.identity().to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    span.in_scope(|| {
        if status >= 500 {
            warn!(status, latency_ms, %caller, "Request failed (5xx)");
        } else if status >= 400 {
            info!(status, latency_ms, %caller, "Request completed (4xx)");
        } else {
            info!(status, latency_ms, %caller, "Request completed");
        }
    });

    response
}
