//! Saving originals into host storage
//!
//! A save is split in two so that validation happens before anything is
//! downloaded:
//!
//! 1. [`AssetPersister::resolve_target`] checks that the requested folder
//!    exists inside the user's storage and is a folder.
//! 2. [`AssetPersister::persist`] picks a free file name and streams the
//!    payload into a newly created file.

use bridge_traits::{ByteStream, FileSystemAccess};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::error::{PersistError, Result};

/// A validated destination folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFolder {
    /// Absolute location in host storage
    pub folder: PathBuf,
    /// Target path as the host sees it, without surrounding slashes
    pub relative: String,
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAsset {
    /// `<target>/<file name>` relative to the user's root folder
    pub path: String,
    pub file_name: String,
    pub bytes_written: u64,
}

/// Reduce a requested file name to its base name
///
/// Falls back to `image_<asset_id>.jpg` when nothing usable remains. Path
/// separators in the asset id are replaced so the fallback stays one segment.
pub fn sanitize_file_name(file_name: &str, asset_id: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." {
        let id = asset_id.replace(['/', '\\'], "_");
        format!("image_{}.jpg", id)
    } else {
        base.to_string()
    }
}

/// Whether `name` is exactly one plain path segment
fn is_single_segment(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Split `name` into stem and extension (the extension keeps its dot)
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Candidate name for collision round `n` (`0` is the name itself)
pub fn candidate_name(file_name: &str, n: u32) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    let (stem, ext) = split_extension(file_name);
    format!("{}_{}{}", stem, n, ext)
}

/// Writes downloaded originals without clobbering existing files
pub struct AssetPersister {
    fs: Arc<dyn FileSystemAccess>,
}

impl AssetPersister {
    pub fn new(fs: Arc<dyn FileSystemAccess>) -> Self {
        Self { fs }
    }

    /// Validate `target_path` inside the storage of `user_id`
    ///
    /// Leading and trailing slashes are ignored; an empty path is the user's
    /// root folder. `.` and `..` segments are rejected.
    #[instrument(skip(self))]
    pub async fn resolve_target(&self, user_id: &str, target_path: &str) -> Result<TargetFolder> {
        let relative = target_path.trim_matches('/');
        let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();

        if segments
            .iter()
            .any(|s| *s == "." || *s == ".." || s.contains('\\'))
        {
            return Err(PersistError::InvalidTarget(target_path.to_string()));
        }

        let mut folder = self.fs.user_directory(user_id).await?;
        for segment in &segments {
            folder.push(segment);
        }

        if !segments.is_empty() {
            if !self.fs.exists(&folder).await? {
                return Err(PersistError::TargetMissing(relative.to_string()));
            }
            if !self.fs.metadata(&folder).await?.is_directory {
                return Err(PersistError::TargetNotFolder(relative.to_string()));
            }
        }

        Ok(TargetFolder {
            folder,
            relative: segments.join("/"),
        })
    }

    /// Stream `body` into a new file in `target`
    ///
    /// If `file_name` is taken, `_1`, `_2`, ... is appended before the
    /// extension until a free name is found.
    #[instrument(skip(self, body), fields(folder = %target.relative))]
    pub async fn persist(
        &self,
        target: &TargetFolder,
        file_name: &str,
        asset_id: &str,
        mut body: ByteStream,
    ) -> Result<SavedAsset> {
        let file_name = sanitize_file_name(file_name, asset_id);

        let mut n = 0u32;
        let (final_name, mut writer) = loop {
            let candidate = candidate_name(&file_name, n);
            if !is_single_segment(&candidate) {
                return Err(PersistError::InvalidFileName(candidate));
            }
            let path = target.folder.join(&candidate);
            n += 1;

            if self.fs.exists(&path).await? {
                continue;
            }

            match self.fs.create_new(&path).await {
                Ok(writer) => break (candidate, writer),
                // Lost a race with another writer; try the next suffix
                Err(e) if e.is_already_exists() => {
                    debug!(candidate = %candidate, "Name taken during create");
                    continue;
                }
                Err(e) => return Err(PersistError::Write(e.to_string())),
            }
        };

        let bytes_written = tokio::io::copy(&mut body, &mut writer)
            .await
            .map_err(|e| PersistError::Write(e.to_string()))?;
        writer
            .shutdown()
            .await
            .map_err(|e| PersistError::Write(e.to_string()))?;

        let path = format!("{}/{}", target.relative, final_name);
        info!(
            file = %final_name,
            bytes = bytes_written,
            "Saved asset to host storage"
        );

        Ok(SavedAsset {
            path,
            file_name: final_name,
            bytes_written,
        })
    }

    /// Absolute path of a saved file, for hosts that need it
    pub fn absolute_path(target: &TargetFolder, saved: &SavedAsset) -> PathBuf {
        Path::new(&target.folder).join(&saved.file_name)
    }
}
