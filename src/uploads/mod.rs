// SPDX-License-Identifier: MIT
//! Profile photo storage — extension allow-list, size cap, and content-hash
//! filenames under `{data_dir}/uploads`.
//!
//! Filenames are derived from the content digest, so re-uploading identical
//! bytes lands on the same file and nothing dangling accumulates.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use sha2::{Digest, Sha256};
use tokio::fs;

/// Extensions accepted for profile photos, lowercase.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("file type {0:?} not allowed; use png, jpg, jpeg, or gif")]
    DisallowedExtension(String),
    #[error("file is empty")]
    Empty,
    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn extension_of(name: &str) -> Result<String, UploadError> {
    let ext = std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(UploadError::DisallowedExtension(ext))
    }
}

/// Content type for a stored photo, by its extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Photo file storage rooted at one uploads directory.
pub struct PhotoStore {
    dir: PathBuf,
    max_bytes: u64,
}

impl PhotoStore {
    pub fn new(dir: PathBuf, max_bytes: u64) -> Self {
        Self { dir, max_bytes }
    }

    /// Validate and persist an upload, returning the stored file name.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let ext = extension_of(original_name)?;
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() as u64 > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = format!("{:x}", hasher.finalize());
        let file_name = format!("{}.{ext}", &digest[..16]);

        fs::create_dir_all(&self.dir)
            .await
            .context("create uploads directory")?;
        fs::write(self.dir.join(&file_name), bytes)
            .await
            .context("write photo file")?;
        Ok(file_name)
    }

    /// Read a stored photo's bytes and content type. `None` when the file
    /// is gone.
    pub async fn read(&self, file_name: &str) -> Result<Option<(Vec<u8>, &'static str)>> {
        match fs::read(self.dir.join(file_name)).await {
            Ok(bytes) => Ok(Some((bytes, content_type_for(file_name)))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("read photo file"),
        }
    }

    /// Delete a stored photo. Missing files are not an error.
    pub async fn remove(&self, file_name: &str) -> Result<()> {
        match fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("delete photo file"),
        }
    }
}
