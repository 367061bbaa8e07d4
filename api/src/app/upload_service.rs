//! Upload service
//!
//! Accepts avatar and group icon images and cleans up replaced ones.

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::ports::{ImageStore, UPLOADS_PREFIX};
use crate::error::AppError;

/// Service for storing uploaded images
pub struct UploadService<IS>
where
    IS: ImageStore,
{
    images: Arc<IS>,
}

impl<IS> UploadService<IS>
where
    IS: ImageStore,
{
    pub fn new(images: Arc<IS>) -> Self {
        Self { images }
    }

    /// Store an uploaded image and return its public URL
    pub async fn upload(
        &self,
        content_type: Option<&str>,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
            return Err(AppError::BadRequest(
                "Only image files are allowed".to_string(),
            ));
        }

        let file_name = format!(
            "{}{}",
            Uuid::new_v4(),
            file_extension(original_name.unwrap_or_default())
        );
        let url = self.images.save(&file_name, bytes).await?;

        tracing::info!(file_name = %file_name, size = bytes.len(), "Stored upload");
        Ok(url)
    }
}

/// `.ext` of the original file name, or an empty string
fn file_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// The stored file name behind an upload URL, if it is safe to touch
pub fn stored_file_name(url: &str) -> Option<&str> {
    let idx = url.rfind(UPLOADS_PREFIX)?;
    let name = &url[idx + UPLOADS_PREFIX.len()..];
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return None;
    }
    Some(name)
}

/// Best-effort removal of a previously uploaded image.
///
/// URLs that do not point into the uploads directory are ignored. Failures
/// are logged and never reach the caller.
pub async fn delete_image_file<IS: ImageStore + ?Sized>(images: &IS, url: Option<&str>) {
    let Some(url) = url else {
        return;
    };
    if !url.contains(UPLOADS_PREFIX) {
        return;
    }
    let Some(name) = stored_file_name(url) else {
        tracing::warn!(url = %url, "Refusing to delete suspicious upload path");
        return;
    };

    match images.remove(name).await {
        Ok(true) => tracing::debug!(file_name = %name, "Deleted old upload"),
        Ok(false) => tracing::debug!(file_name = %name, "Old upload already gone"),
        Err(e) => tracing::warn!(file_name = %name, error = %e, "Failed to delete old upload"),
    }
}
