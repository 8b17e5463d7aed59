use crate::errors::ServiceError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// A stored upload: where it lives on disk and the URL clients use
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub url: String,
    pub path: PathBuf,
}

/// Local-disk storage for uploads, served back under `/media`
#[derive(Debug, Clone)]
pub struct MediaStorage {
    upload_dir: PathBuf,
    max_bytes: usize,
}

impl MediaStorage {
    pub fn new(upload_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_bytes,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Writes upload bytes under a generated name and returns the stored
    /// file's relative URL.
    ///
    /// The original name only contributes its extension; everything else is
    /// replaced so uploads can never traverse out of the upload directory.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn store(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::ValidationError(
                "Uploaded file is empty".to_string(),
            ));
        }
        if bytes.len() > self.max_bytes {
            return Err(ServiceError::ValidationError(format!(
                "Uploaded file exceeds the maximum size of {} bytes",
                self.max_bytes
            )));
        }

        fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| ServiceError::StorageError(e.to_string()))?;

        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();
        let file_name = format!("{}{}", Uuid::new_v4(), extension);
        let path = self.upload_dir.join(&file_name);

        fs::write(&path, bytes)
            .await
            .map_err(|e| ServiceError::StorageError(e.to_string()))?;

        debug!(file = %file_name, "Stored uploaded file");

        Ok(StoredFile {
            url: format!("/media/{}", file_name),
            file_name,
            path,
        })
    }

    /// Best-effort removal of a stored file by its `/media/...` URL
    #[instrument(skip(self))]
    pub async fn remove_by_url(&self, url: &str) {
        let Some(file_name) = url.strip_prefix("/media/") else {
            warn!(url = %url, "Refusing to remove file outside the media root");
            return;
        };
        if file_name.contains('/') || file_name.contains("..") {
            warn!(url = %url, "Refusing to remove file outside the media root");
            return;
        }
        let path = self.upload_dir.join(file_name);
        if let Err(e) = fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove stored file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn stores_and_removes_files() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), 1024);

        let stored = storage.store("invoice.PDF", b"content").await.unwrap();
        assert!(stored.url.starts_with("/media/"));
        assert!(stored.file_name.ends_with(".pdf"));
        assert!(stored.path.exists());

        storage.remove_by_url(&stored.url).await;
        assert!(!stored.path.exists());
    }

    #[tokio::test]
    async fn rejects_oversized_uploads() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), 4);
        let err = storage.store("big.bin", b"too large").await.unwrap_err();
        assert_matches::assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[tokio::test]
    async fn strips_hostile_file_names() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), 1024);
        let stored = storage.store("../../etc/passwd", b"x").await.unwrap();
        assert!(!stored.file_name.contains(".."));
        assert!(stored.path.starts_with(dir.path()));
    }
}
