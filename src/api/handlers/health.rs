use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub index: String,
    pub media_count: usize,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let index_status = match tokio::fs::try_exists(state.store.index_path()).await {
        Ok(true) => "present",
        Ok(false) => "missing",
        Err(_) => "unreadable",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        index: index_status.to_string(),
        media_count: state.store.get_media_db().await.len(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
