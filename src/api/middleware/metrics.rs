use axum::{
    extract::Request,
    http::{HeaderMap, Method, header::CONTENT_LENGTH},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;

/// Which media surface a request hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRoute {
    Upload,
    Index,
    Blob,
    Other,
}

impl MediaRoute {
    pub fn classify(method: &Method, path: &str) -> Self {
        if method == Method::POST && path == "/api/media/upload" {
            MediaRoute::Upload
        } else if path == "/api/media" || path.starts_with("/api/media/") {
            MediaRoute::Index
        } else if path.starts_with("/media/") {
            MediaRoute::Blob
        } else {
            MediaRoute::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaRoute::Upload => "upload",
            MediaRoute::Index => "index",
            MediaRoute::Blob => "blob",
            MediaRoute::Other => "other",
        }
    }
}

fn content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Logs latency per request, with upload payload and served blob sizes.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let route = MediaRoute::classify(&method, uri.path());
    let request_bytes = content_length(req.headers());

    let response = next.run(req).await;
    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis();

    match route {
        MediaRoute::Upload => info!(
            target: "metrics",
            route = route.as_str(),
            status,
            latency_ms = %latency_ms,
            upload_bytes = request_bytes,
            "media_upload"
        ),
        MediaRoute::Blob => info!(
            target: "metrics",
            route = route.as_str(),
            uri = %uri,
            status,
            latency_ms = %latency_ms,
            served_bytes = content_length(response.headers()),
            "media_served"
        ),
        MediaRoute::Index | MediaRoute::Other => info!(
            target: "metrics",
            route = route.as_str(),
            method = %method,
            uri = %uri,
            status,
            latency_ms = %latency_ms,
            "request_completed"
        ),
    }

    response
}
