//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based file system implementation
///
/// Provides async file I/O operations using:
/// - `tokio::fs` for async operations
/// - One folder per user under a shared storage root
pub struct TokioFileSystem {
    storage_root: PathBuf,
}

impl TokioFileSystem {
    /// Create a new file system accessor rooted in the platform data directory
    pub fn new() -> Self {
        let storage_root = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("photo-bridge")
            .join("users");

        Self { storage_root }
    }

    /// Create a new file system accessor with a custom storage root
    pub fn with_storage_root(storage_root: PathBuf) -> Self {
        Self { storage_root }
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

impl Default for TokioFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn user_directory(&self, user_id: &str) -> Result<PathBuf> {
        if user_id.is_empty() || user_id.contains(['/', '\\']) || user_id == ".." {
            return Err(BridgeError::OperationFailed(format!(
                "Invalid user id for storage: {:?}",
                user_id
            )));
        }

        let dir = self.storage_root.join(user_id);
        if !dir.exists() {
            fs::create_dir_all(&dir).await.map_err(Self::map_io_error)?;
            debug!(path = ?dir, "Created user directory");
        }
        Ok(dir)
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(Self::map_io_error)
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error)?;

        Ok(FileMetadata {
            size: metadata.len(),
            created_at: metadata
                .created()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64),
            modified_at: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64),
            is_directory: metadata.is_dir(),
        })
    }

    async fn create_new(
        &self,
        path: &Path,
    ) -> Result<Box<dyn tokio::io::AsyncWrite + Send + Unpin>> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created file for writing");
        Ok(Box::new(file))
    }
}
