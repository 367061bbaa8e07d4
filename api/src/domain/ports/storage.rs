//! Image storage port
//!
//! Uploaded avatars and group icons are kept outside the database. The store
//! hands out public URLs of the form `/uploads/<file name>`.

use async_trait::async_trait;

use crate::error::StorageError;

/// URL prefix of every stored image
pub const UPLOADS_PREFIX: &str = "/uploads/";

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist the bytes under `file_name` and return the public URL
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Remove a stored file; returns whether anything was deleted
    async fn remove(&self, file_name: &str) -> Result<bool, StorageError>;
}
