//! Upload handler

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::error::AppError;
use crate::AppState;

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /upload
///
/// Store an image sent as multipart field `file`.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let url = state
            .upload_service
            .upload(content_type.as_deref(), file_name.as_deref(), &bytes)
            .await?;

        return Ok(Json(UploadResponse { url }));
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}
