use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use super::auth::AuthUser;

/// Request logging middleware.
///
/// Logs every API request as a structured `tracing` event. Paths carry
/// record ids only, never clinical text.
pub async fn request_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let actor = response
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.sub.clone())
        .unwrap_or_default();
    tracing::info!(
        method = %method,
        path = %uri,
        status = status,
        latency_ms = started.elapsed().as_millis() as u64,
        actor = %actor,
        "api_request"
    );

    response
}
