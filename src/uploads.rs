use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Allowed attachment extensions
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "pdf"];

/// Prefix of every path handed out by [`LocalUploader`].
const PUBLIC_PREFIX: &str = "uploads/";

/// Stores attachments and hands back the reference kept on the feed item.
#[async_trait]
pub trait AttachmentUploader: Send + Sync {
    async fn upload(&self, file_name: &str, data: &[u8]) -> Result<String>;
    async fn remove(&self, path: &str) -> Result<()>;
}

/// Writes attachments to a directory on local disk.
pub struct LocalUploader {
    uploads_dir: PathBuf,
    max_file_size: usize,
}

impl LocalUploader {
    pub fn new(uploads_dir: impl Into<PathBuf>, max_file_size: usize) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            max_file_size,
        }
    }

    fn validated_extension(&self, file_name: &str, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Err(AppError::Validation("Attachment is empty".to_string()));
        }

        if data.len() > self.max_file_size {
            return Err(AppError::Validation(format!(
                "File too large (max {} bytes)",
                self.max_file_size
            )));
        }

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::Validation(format!(
                "Invalid file type. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        Ok(extension)
    }
}

#[async_trait]
impl AttachmentUploader for LocalUploader {
    /// Returns the relative path to the file (e.g., "uploads/abc123.jpg").
    async fn upload(&self, file_name: &str, data: &[u8]) -> Result<String> {
        let extension = self.validated_extension(file_name, data)?;

        fs::create_dir_all(&self.uploads_dir).await.map_err(|e| {
            AppError::Internal(format!("Failed to create uploads directory: {}", e))
        })?;

        let new_file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let file_path = self.uploads_dir.join(&new_file_name);

        let mut file = fs::File::create(&file_path).await.map_err(|e| {
            AppError::Internal(format!("Failed to create file: {}", e))
        })?;

        file.write_all(data).await.map_err(|e| {
            AppError::Internal(format!("Failed to write file: {}", e))
        })?;

        Ok(format!("{}{}", PUBLIC_PREFIX, new_file_name))
    }

    /// Paths that did not come from this uploader are left alone.
    async fn remove(&self, path: &str) -> Result<()> {
        let Some(file_name) = path.strip_prefix(PUBLIC_PREFIX) else {
            return Ok(());
        };

        // Never follow a reference outside the uploads directory.
        if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
            return Ok(());
        }

        let file_path = self.uploads_dir.join(file_name);
        if fs::try_exists(&file_path).await.unwrap_or(false) {
            fs::remove_file(&file_path).await.map_err(|e| {
                AppError::Internal(format!("Failed to delete file: {}", e))
            })?;
        }

        Ok(())
    }
}
