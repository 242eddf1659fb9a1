/// Media store
///
/// Moves staged upload files into the storage backend and hands back
/// servable URLs. Files are content-addressed: the storage name is the
/// SHA-256 of the bytes plus a MIME-derived extension, so re-uploading the
/// same file is idempotent.
use crate::{
    error::{ApiError, ApiResult},
    media::{
        disk::DiskMediaBackend, extension_for_mime, mime_for_extension, MediaBackend,
        MediaStoreConfig, MediaUpload, StagedFile,
    },
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::fs;

/// Main media store
#[derive(Clone)]
pub struct MediaStore {
    config: MediaStoreConfig,
    backend: Arc<dyn MediaBackend>,
}

impl MediaStore {
    /// Create a media store over the disk backend
    pub fn new(config: MediaStoreConfig) -> Self {
        let backend = Arc::new(DiskMediaBackend::new(config.media_directory.clone()));
        Self { config, backend }
    }

    /// Create a media store over a custom backend
    pub fn with_backend(config: MediaStoreConfig, backend: Arc<dyn MediaBackend>) -> Self {
        Self { config, backend }
    }

    /// Upload a staged file into permanent storage
    ///
    /// Reads the staged bytes, stores them under their content hash, and
    /// removes the staged file best-effort. On success the returned
    /// `MediaUpload` carries the servable URL.
    pub async fn upload(&self, staged: &StagedFile) -> ApiResult<MediaUpload> {
        let data = fs::read(&staged.path)
            .await
            .map_err(|e| ApiError::MediaStorage(format!("Failed to read staged file: {}", e)))?;

        if data.is_empty() {
            staged.discard().await;
            return Err(ApiError::MediaStorage("Staged file is empty".to_string()));
        }

        tracing::debug!(
            field = %staged.field_name,
            size = staged.size,
            "storing staged upload"
        );

        let digest = Sha256::digest(&data);
        let name = format!(
            "{}.{}",
            hex::encode(digest),
            extension_for_mime(&staged.mime_type)
        );

        let size = data.len();
        self.backend.put(&name, data).await?;

        staged.discard().await;

        Ok(MediaUpload {
            url: format!("{}/media/{}", self.config.public_url, name),
            name,
            size,
            mime_type: staged.mime_type.clone(),
        })
    }

    /// Fetch stored media bytes and their MIME type by storage name
    pub async fn get(&self, name: &str) -> ApiResult<Option<(Vec<u8>, &'static str)>> {
        // Reject path traversal before it reaches the backend
        if name.contains('/') || name.contains("..") {
            return Ok(None);
        }

        let data = self.backend.get(name).await?;
        Ok(data.map(|bytes| (bytes, mime_for_extension(name))))
    }
}
