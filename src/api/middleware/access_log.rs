//! Access logging middleware.
//!
//! Logs every API request with method, path, response status, latency
//! and, for authenticated routes, the caller id. Runs outermost so
//! rejected requests are logged too.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::middleware::auth::AuthenticatedCaller;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match response.extensions().get::<AuthenticatedCaller>() {
        Some(AuthenticatedCaller(caller_id)) => {
            tracing::info!(%method, %path, status, elapsed_ms, caller_id = %caller_id, "API request");
        }
        None => {
            tracing::info!(%method, %path, status, elapsed_ms, "API request");
        }
    }

    response
}
