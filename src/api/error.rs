use crate::services::media_store::MediaError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Media(e) => match e {
                MediaError::NotFound(id) => {
                    (StatusCode::NOT_FOUND, format!("Media '{}' not found", id))
                }
                MediaError::InvalidCategory(_) | MediaError::InvalidType(_) => {
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
                other => {
                    tracing::error!("Media error: {:?}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
