use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Extension for an allow-listed image MIME type. Anything outside the
/// map is rejected at ingestion.
pub fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpg" => Some("jpg"),
        "image/jpeg" => Some("jpeg"),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Unsupported image type: {0}")]
    UnsupportedMime(String),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Keyed image storage on local disk. Files are served verbatim under
/// /uploads/images by the router.
#[derive(Clone)]
pub struct ImageStore {
    base_dir: PathBuf,
}

impl ImageStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .await
            .with_context(|| format!("Failed to create upload dir {}", self.base_dir.display()))
    }

    /// Persist an uploaded binary under a collision-resistant key
    /// (`{uuid}-{millis}.{ext}`) and return the key.
    pub async fn ingest(&self, bytes: &[u8], mime: &str) -> Result<String, ImageError> {
        let ext =
            extension_for(mime).ok_or_else(|| ImageError::UnsupportedMime(mime.to_string()))?;
        let key = format!(
            "{}-{}.{}",
            Uuid::new_v4(),
            chrono::Utc::now().timestamp_millis(),
            ext
        );
        fs::write(self.base_dir.join(&key), bytes)
            .await
            .with_context(|| format!("Failed to write image {}", key))?;
        Ok(key)
    }

    /// Remove a stored image. Callers treat failure as non-fatal and
    /// only log it; the parent record mutation has already committed.
    pub async fn delete(&self, key: &str) -> Result<()> {
        if key.contains('/') || key.contains("..") {
            bail!("Refusing to delete image with unsafe key: {}", key);
        }
        fs::remove_file(self.base_dir.join(key))
            .await
            .with_context(|| format!("Failed to delete image {}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_allow_list() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpg"), Some("jpg"));
        assert_eq!(extension_for("image/jpeg"), Some("jpeg"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for(""), None);
    }

    #[tokio::test]
    async fn test_ingest_writes_file_with_extension() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());

        let key = store.ingest(b"png-bytes", "image/png").await.unwrap();
        assert!(key.ends_with(".png"));

        let stored = tokio::fs::read(dir.path().join(&key)).await.unwrap();
        assert_eq!(stored, b"png-bytes");
    }

    #[tokio::test]
    async fn test_ingest_keys_are_unique() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());

        let a = store.ingest(b"a", "image/jpeg").await.unwrap();
        let b = store.ingest(b"b", "image/jpeg").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_ingest_rejects_unknown_mime() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());

        let err = store.ingest(b"gif-bytes", "image/gif").await.unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedMime(_)));
        // nothing written
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());

        let key = store.ingest(b"bytes", "image/png").await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(!dir.path().join(&key).exists());
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());
        // the caller logs this and carries on
        assert!(store.delete("missing.png").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_refuses_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());
        assert!(store.delete("../etc/passwd").await.is_err());
        assert!(store.delete("a/b.png").await.is_err());
    }
}
