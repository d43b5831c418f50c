//! Local-disk storage for observation photos.
//!
//! Files are content-addressed (SHA-256 of the bytes), so re-uploading the
//! same photo returns the same URL and writes nothing new.

use std::path::PathBuf;

use canopy_core::error::CoreError;
use canopy_core::observation::{photo_extension, photo_file_name};
use serde::Serialize;

use crate::config::PhotoConfig;
use crate::error::{AppError, AppResult};

/// A photo that has been written to storage.
#[derive(Debug, Clone, Serialize)]
pub struct StoredPhoto {
    pub file_name: String,
    pub url: String,
    pub size_bytes: usize,
}

/// Writes uploaded photos under the configured directory.
#[derive(Debug)]
pub struct PhotoStore {
    config: PhotoConfig,
}

impl PhotoStore {
    pub fn new(config: PhotoConfig) -> Self {
        Self { config }
    }

    pub fn storage_dir(&self) -> &PathBuf {
        &self.config.storage_dir
    }

    /// Create the storage directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.config.storage_dir)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to create photo dir: {e}")))
    }

    /// Validate and persist one uploaded photo.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> AppResult<StoredPhoto> {
        if data.is_empty() {
            return Err(AppError::BadRequest(format!("Photo '{original_name}' is empty")));
        }
        if data.len() > self.config.max_bytes {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Photo '{original_name}' is {} bytes; the limit is {}",
                data.len(),
                self.config.max_bytes
            ))));
        }

        let extension = photo_extension(original_name)?;
        let file_name = photo_file_name(data, &extension);

        self.ensure_dir().await?;

        let dest = self.config.storage_dir.join(&file_name);
        if !tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            tokio::fs::write(&dest, data)
                .await
                .map_err(|e| AppError::InternalError(format!("Failed to write photo: {e}")))?;
        }

        Ok(StoredPhoto {
            url: format!("{}/{file_name}", self.config.base_url),
            file_name,
            size_bytes: data.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn store(dir: &tempfile::TempDir, max_bytes: usize) -> PhotoStore {
        PhotoStore::new(PhotoConfig {
            storage_dir: dir.path().join("photos"),
            base_url: "/media/photos".to_string(),
            max_bytes,
        })
    }

    #[tokio::test]
    async fn saves_content_addressed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, 1024);

        let first = store.save("Leaf.JPG", b"pixels").await.unwrap();
        let second = store.save("copy.jpg", b"pixels").await.unwrap();

        assert_eq!(first.file_name, second.file_name);
        assert!(first.url.starts_with("/media/photos/"));
        assert!(first.url.ends_with(".jpg"));
        assert_eq!(first.size_bytes, 6);

        let written = tokio::fs::read(store.storage_dir().join(&first.file_name))
            .await
            .unwrap();
        assert_eq!(written, b"pixels");
    }

    #[tokio::test]
    async fn rejects_empty_oversized_and_unknown_types() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, 4);

        assert_matches!(store.save("a.png", b"").await, Err(AppError::BadRequest(_)));
        assert_matches!(
            store.save("a.png", b"too large").await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_matches!(
            store.save("a.exe", b"ok").await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }
}
