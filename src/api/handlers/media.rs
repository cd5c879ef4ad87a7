use crate::AppState;
use crate::api::error::AppError;
use crate::models::{MediaCategory, MediaItem, MediaType};
use crate::services::media_store::MediaError;
use crate::utils::validation::verify_declared_type;
use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub media: MediaItem,
}

#[derive(Serialize, ToSchema)]
pub struct MediaListResponse {
    pub media: Vec<MediaItem>,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Deserialize)]
pub struct ListMediaQuery {
    pub category: Option<String>,
}

fn multipart_error(e: MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}

fn parse_category(raw: &str) -> Result<MediaCategory, AppError> {
    raw.parse::<MediaCategory>()
        .map_err(|c| AppError::Media(MediaError::InvalidCategory(c)))
}

#[utoipa::path(
    post,
    path = "/api/media/upload",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "Fields: `file` (binary), `category` (events|projects|blogs|members), `type` (image|video|reel)"
    ),
    responses(
        (status = 200, description = "Media stored", body = UploadResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Upload failed")
    ),
    tag = "media"
)]
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    if let Err(e) = state.store.init().await {
        tracing::warn!("Media storage initialization failed before upload: {}", e);
    }

    let mut file: Option<(String, Bytes)> = None;
    let mut category: Option<String> = None;
    let mut media_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let original_name = field.file_name().unwrap_or("unnamed").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((original_name, data));
            }
            "category" => {
                let text = field.text().await.map_err(multipart_error)?;
                category = Some(text).filter(|t| !t.is_empty());
            }
            "type" => {
                let text = field.text().await.map_err(multipart_error)?;
                media_type = Some(text).filter(|t| !t.is_empty());
            }
            _ => {}
        }
    }

    let (Some((original_name, data)), Some(category), Some(media_type)) =
        (file, category, media_type)
    else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    if data.len() > state.config.max_file_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            data.len(),
            state.config.max_file_size
        )));
    }

    let category = parse_category(&category)?;
    let media_type = media_type
        .parse::<MediaType>()
        .map_err(|t| AppError::Media(MediaError::InvalidType(t)))?;

    if state.config.verify_content {
        verify_declared_type(&data, media_type).map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    let media = state
        .store
        .save_media(&data, &original_name, category, media_type)
        .await
        .map_err(|e| AppError::Internal(format!("Upload failed: {}", e)))?;

    Ok(Json(UploadResponse {
        success: true,
        media,
    }))
}

#[utoipa::path(
    get,
    path = "/api/media",
    params(
        ("category" = Option<String>, Query, description = "Only list items of this category")
    ),
    responses(
        (status = 200, description = "Indexed media in upload order", body = MediaListResponse),
        (status = 400, description = "Unknown category")
    ),
    tag = "media"
)]
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<ListMediaQuery>,
) -> Result<Json<MediaListResponse>, AppError> {
    let media = match query.category.as_deref() {
        Some(raw) => {
            state
                .store
                .get_media_by_category(parse_category(raw)?)
                .await
        }
        None => state.store.get_media_db().await,
    };

    Ok(Json(MediaListResponse { media }))
}

#[utoipa::path(
    get,
    path = "/api/media/{id}",
    params(
        ("id" = String, Path, description = "Media id")
    ),
    responses(
        (status = 200, description = "Media record", body = MediaItem),
        (status = 404, description = "Media not found")
    ),
    tag = "media"
)]
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MediaItem>, AppError> {
    match state.store.get_media(&id).await {
        Some(item) => Ok(Json(item)),
        None => Err(AppError::Media(MediaError::NotFound(id))),
    }
}

#[utoipa::path(
    delete,
    path = "/api/media/{id}",
    params(
        ("id" = String, Path, description = "Media id")
    ),
    responses(
        (status = 200, description = "Blob and index entry removed", body = DeleteResponse),
        (status = 404, description = "Media not found"),
        (status = 500, description = "Blob could not be removed")
    ),
    tag = "media"
)]
pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let removed = state.store.delete_media(&id).await?;

    Ok(Json(DeleteResponse {
        success: true,
        id: removed.id,
    }))
}
