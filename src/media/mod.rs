/// Media storage
///
/// Handles staged upload files for avatars and cover images. Uploads are
/// staged to local disk by the multipart boundary, then pushed into a
/// storage backend which hands back a servable URL.

pub mod disk;
pub mod staging;
pub mod store;

pub use staging::{MultipartForm, StagedFile};
pub use store::MediaStore;

use crate::error::ApiResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Media storage backend trait
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Store a file under a storage name
    async fn put(&self, name: &str, data: Vec<u8>) -> ApiResult<()>;

    /// Retrieve a file by storage name
    async fn get(&self, name: &str) -> ApiResult<Option<Vec<u8>>>;

    /// Delete a file by storage name
    async fn delete(&self, name: &str) -> ApiResult<()>;

    /// Check whether a file exists
    async fn exists(&self, name: &str) -> ApiResult<bool>;
}

/// Configuration for the media store
#[derive(Debug, Clone)]
pub struct MediaStoreConfig {
    /// Permanent storage location
    pub media_directory: PathBuf,
    /// Base URL prefixed onto stored names
    pub public_url: String,
}

/// A successfully stored upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    /// Servable URL for the stored file
    pub url: String,
    /// Storage name (content hash plus extension)
    pub name: String,
    pub size: usize,
    pub mime_type: String,
}

/// Map a MIME type to the stored file extension
pub(crate) fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

/// Map a stored file extension back to its MIME type
pub(crate) fn mime_for_extension(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
