/// Multipart staging
///
/// Writes every incoming multipart part to the staging directory before any
/// handler logic runs, and hands back a typed view of the form. Handlers
/// only ever see `StagedFile` values, never raw multipart state.
use crate::error::{ApiError, ApiResult};
use axum::extract::Multipart;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// A file part staged to local disk
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub field_name: String,
    pub path: PathBuf,
    pub mime_type: String,
    pub size: usize,
}

impl StagedFile {
    /// Best-effort removal of the staged file
    ///
    /// Failures are logged and swallowed; a leaked temp file is not worth
    /// failing the request over.
    pub async fn discard(&self) {
        if let Err(e) = fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove staged file {:?}: {}", self.path, e);
            }
        }
    }
}

/// Typed view of a staged multipart form
///
/// Text parts are collected by field name; file parts are staged to disk,
/// keeping the first file per field name (single-file fields).
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, StagedFile>,
}

impl MultipartForm {
    /// Drain a multipart stream, staging file parts under `staging_dir`
    pub async fn stage(multipart: &mut Multipart, staging_dir: &Path) -> ApiResult<Self> {
        fs::create_dir_all(staging_dir)
            .await
            .map_err(|e| ApiError::MediaStorage(format!("Failed to create staging dir: {}", e)))?;

        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(String::from) else {
                continue;
            };

            if field.file_name().is_some() {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read upload: {}", e)))?;

                if data.is_empty() {
                    continue;
                }

                let path = staging_dir.join(Uuid::new_v4().to_string());
                fs::write(&path, &data).await.map_err(|e| {
                    ApiError::MediaStorage(format!("Failed to stage upload: {}", e))
                })?;

                let staged = StagedFile {
                    field_name: name.clone(),
                    path,
                    mime_type,
                    size: data.len(),
                };

                // Keep the first file per field; extras are discarded
                if form.files.contains_key(&name) {
                    staged.discard().await;
                } else {
                    form.files.insert(name, staged);
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Malformed form field: {}", e)))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Text field by name
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Required text field, trimmed; blank or missing is a validation error
    pub fn require_text(&self, name: &str) -> ApiResult<String> {
        let value = self.text(name).map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(ApiError::Validation(format!(
                "Field '{}' is required",
                name
            )));
        }
        Ok(value.to_string())
    }

    /// Staged file by field name
    pub fn file(&self, name: &str) -> Option<&StagedFile> {
        self.files.get(name)
    }

    /// Remove and return a staged file by field name
    pub fn take_file(&mut self, name: &str) -> Option<StagedFile> {
        self.files.remove(name)
    }

    /// Discard every staged file still held by the form
    pub async fn discard_files(&mut self) {
        for (_, staged) in self.files.drain() {
            staged.discard().await;
        }
    }
}
