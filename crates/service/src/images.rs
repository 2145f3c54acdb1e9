//! Profile image storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;

const ALLOWED_TYPES: &[(&str, &str)] = &[("image/jpeg", "jpg"), ("image/png", "png")];
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Persists uploaded bytes and returns the stored file name.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn store_image(&self, bytes: &[u8], ext: &str) -> Result<String, ServiceError>;
}

/// Checks an upload and returns the extension to store it under.
pub fn validate_image(
    content_type: Option<&str>,
    file_name: Option<&str>,
    len: usize,
    max_bytes: usize,
) -> Result<String, ServiceError> {
    if len == 0 {
        return Err(ServiceError::Validation("no image uploaded".into()));
    }
    if len > max_bytes {
        return Err(ServiceError::Validation(format!("image exceeds {} bytes", max_bytes)));
    }
    let Some(default_ext) = content_type
        .and_then(|ct| ALLOWED_TYPES.iter().find(|(t, _)| t.eq_ignore_ascii_case(ct.trim())))
        .map(|(_, ext)| *ext)
    else {
        return Err(ServiceError::Validation("only jpeg and png images are allowed".into()));
    };
    match file_name.and_then(|n| Path::new(n).extension()).and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
                Ok(ext)
            } else {
                Err(ServiceError::Validation("only .jpg, .jpeg and .png files are allowed".into()))
            }
        }
        None => Ok(default_ext.to_string()),
    }
}

pub struct DiskImageStore {
    dir: PathBuf,
}

impl DiskImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn store_image(&self, bytes: &[u8], ext: &str) -> Result<String, ServiceError> {
        let filename = format!("{}-{}.{}", Utc::now().timestamp_millis(), Uuid::new_v4(), ext);
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ServiceError::Internal(format!("writing {}: {}", path.display(), e)))?;
        debug!(%filename, size = bytes.len(), "image_stored");
        Ok(filename)
    }
}
