use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

/// Largest error body that gets copied into the log
const MAX_LOGGED_BODY: usize = 1024;

pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;

    if response.status().is_client_error() {
        warn!("{} {} -> {}", method, uri, response.status());
        return response;
    }

    if response.status().is_server_error() {
        let (mut parts, body) = response.into_parts();
        let bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
            Ok(b) => b,
            Err(e) => {
                error!("Failed to read error response body: {}", e);
                return Response::from_parts(parts, Body::empty());
            }
        };
        let body_str = String::from_utf8_lossy(&bytes);

        error!(
            "Server error on {} {} - Status: {}, Body: {}",
            method, uri, parts.status, body_str
        );

        // The body was consumed, rebuild it
        parts.headers.remove(axum::http::header::CONTENT_LENGTH);
        Response::from_parts(parts, Body::from(bytes))
    } else {
        response
    }
}
