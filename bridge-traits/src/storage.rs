//! Storage and File System Abstractions
//!
//! Provides the platform-agnostic trait used to place downloaded assets into
//! host file storage.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts the host file storage a user saves assets into:
/// - Desktop: Direct filesystem access under the platform data directory
/// - Server hosts: Per-user storage roots
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn has_photo(fs: &dyn FileSystemAccess, user_id: &str) -> Result<bool> {
///     let root = fs.user_directory(user_id).await?;
///     fs.exists(&root.join("photo.jpg")).await
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Get the root folder of a user's file storage
    ///
    /// Target folders passed by the host are resolved relative to this path.
    async fn user_directory(&self, user_id: &str) -> Result<PathBuf>;

    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a new file for streaming writes
    ///
    /// Must fail with an `AlreadyExists` I/O error instead of truncating an
    /// existing file.
    async fn create_new(
        &self,
        path: &Path,
    ) -> Result<Box<dyn tokio::io::AsyncWrite + Send + Unpin>>;
}
