/// Disk-based media storage backend
use crate::{
    error::{ApiError, ApiResult},
    media::MediaBackend,
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Disk storage backend
///
/// Stores media on the local filesystem with directory sharding based on
/// name prefixes to prevent too many files in one directory.
#[derive(Clone)]
pub struct DiskMediaBackend {
    base_path: PathBuf,
}

impl DiskMediaBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the file path for a storage name
    ///
    /// Uses directory sharding: {base}/{first2chars}/{name}
    fn file_path(&self, name: &str) -> PathBuf {
        if name.len() >= 2 {
            let shard = &name[0..2];
            self.base_path.join(shard).join(name)
        } else {
            self.base_path.join("_").join(name)
        }
    }

    /// Ensure the shard directory for a name exists
    async fn ensure_dir(&self, name: &str) -> ApiResult<PathBuf> {
        let path = self.file_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ApiError::MediaStorage(format!("Failed to create media directory: {}", e))
            })?;
        }
        Ok(path)
    }
}

#[async_trait]
impl MediaBackend for DiskMediaBackend {
    async fn put(&self, name: &str, data: Vec<u8>) -> ApiResult<()> {
        let path = self.ensure_dir(name).await?;

        fs::write(&path, data)
            .await
            .map_err(|e| ApiError::MediaStorage(format!("Failed to write media {}: {}", name, e)))?;

        Ok(())
    }

    async fn get(&self, name: &str) -> ApiResult<Option<Vec<u8>>> {
        let path = self.file_path(name);

        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApiError::MediaStorage(format!(
                "Failed to read media {}: {}",
                name, e
            ))),
        }
    }

    async fn delete(&self, name: &str) -> ApiResult<()> {
        let path = self.file_path(name);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::MediaStorage(format!(
                "Failed to delete media {}: {}",
                name, e
            ))),
        }
    }

    async fn exists(&self, name: &str) -> ApiResult<bool> {
        Ok(self.file_path(name).exists())
    }
}
