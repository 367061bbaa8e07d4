//! Filesystem image store
//!
//! Stores uploads as flat files inside one directory. Serving them under
//! `/uploads/` is left to the reverse proxy.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::ports::{ImageStore, UPLOADS_PREFIX};
use crate::error::StorageError;

/// ImageStore backed by a local directory
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let is_plain = Path::new(file_name)
            .file_name()
            .is_some_and(|name| name == file_name);
        if !is_plain || file_name.contains("..") {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }
        Ok(self.root.join(file_name))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let path = self.path_for(file_name)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(format!("{}{}", UPLOADS_PREFIX, file_name))
    }

    async fn remove(&self, file_name: &str) -> Result<bool, StorageError> {
        let path = self.path_for(file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
