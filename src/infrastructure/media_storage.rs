// Media storage - pluggable blob storage for uploaded photos and videos.

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Maximum accepted upload size: 50 MB.
pub const MAX_MEDIA_BYTES: usize = 50 * 1024 * 1024;

/// Object storage seam. The disk implementation backs local deployments;
/// tests substitute their own directory.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Persist a blob and return the public URL it will be served from.
    async fn store(&self, filename: &str, bytes: &[u8]) -> AppResult<String>;
}

/// Stores uploads under a local directory served at `/media`.
pub struct DiskMediaStorage {
    root: PathBuf,
}

impl DiskMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl MediaStorage for DiskMediaStorage {
    async fn store(&self, filename: &str, bytes: &[u8]) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::StorageError(format!("Failed to create media directory: {}", e))
        })?;

        // Random prefix keeps distinct uploads of the same filename apart.
        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_filename(filename));
        let path = self.root.join(&stored_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to write {}: {}", stored_name, e)))?;

        Ok(format!("/media/{}", stored_name))
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("goal video.mp4"), "goal_video.mp4");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[tokio::test]
    async fn store_writes_file_and_returns_media_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskMediaStorage::new(dir.path());

        let url = storage.store("goal.jpg", b"jpegbytes").await.unwrap();
        assert!(url.starts_with("/media/"));
        assert!(url.ends_with("-goal.jpg"));

        let on_disk = dir.path().join(url.trim_start_matches("/media/"));
        assert_eq!(tokio::fs::read(on_disk).await.unwrap(), b"jpegbytes");
    }
}
