pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::MediaConfig;
use crate::services::media_store::MediaStore;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::media::upload_media,
        api::handlers::media::list_media,
        api::handlers::media::get_media,
        api::handlers::media::delete_media,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::MediaItem,
            models::MediaCategory,
            models::MediaType,
            api::handlers::media::UploadResponse,
            api::handlers::media::MediaListResponse,
            api::handlers::media::DeleteResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "media", description = "Media upload and index endpoints"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MediaStore>,
    pub config: MediaConfig,
}

pub fn create_app(state: AppState) -> Router {
    // Leave room for multipart framing around the file itself
    let body_limit = state.config.max_file_size + 1024 * 1024;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/api/media", get(api::handlers::media::list_media))
        .route(
            "/api/media/upload",
            post(api::handlers::media::upload_media).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/media/:id",
            get(api::handlers::media::get_media).delete(api::handlers::media::delete_media),
        )
        .nest_service("/media", ServeDir::new(&state.config.media_root))
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        // Inside the request-id layer, so spans see the assigned id
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
