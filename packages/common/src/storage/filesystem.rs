use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, BufReader};

use super::error::StorageError;
use super::traits::{AssetStore, BoxReader};
use crate::filename::contains_path_traversal;
use crate::range::ByteRange;

/// Filesystem-backed durable asset store.
///
/// Assets live under `{base_path}/{category}/{generated name}`; the store
/// itself only sees relative paths and never interprets them.
pub struct FilesystemAssetStore {
    base_path: PathBuf,
}

impl FilesystemAssetStore {
    /// Create a new filesystem asset store, creating the root if needed.
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a relative store path to a filesystem path under the root.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let trimmed = relative.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('/')
            || trimmed.contains('\0')
            || trimmed.contains("//")
            || contains_path_traversal(trimmed)
            || Path::new(trimmed).is_absolute()
        {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.base_path.join(trimmed))
    }
}

#[async_trait]
impl AssetStore for FilesystemAssetStore {
    async fn move_into(&self, src: &Path, dst: &str) -> Result<(), StorageError> {
        let dst_path = self.resolve(dst)?;

        if let Some(parent) = dst_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Linking fails atomically when the destination exists, unlike rename.
        match fs::hard_link(src, &dst_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(dst.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = fs::remove_file(src).await {
            let _ = fs::remove_file(&dst_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(&full).await?)
    }

    async fn size(&self, path: &str) -> Result<u64, StorageError> {
        let full = self.resolve(path)?;
        match fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(StorageError::NotFound(path.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn open_range(
        &self,
        path: &str,
        range: Option<ByteRange>,
    ) -> Result<BoxReader, StorageError> {
        let full = self.resolve(path)?;
        let mut file = match fs::File::open(&full).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        match range {
            Some(range) => {
                file.seek(SeekFrom::Start(range.start)).await?;
                Ok(Box::new(BufReader::new(file).take(range.length())))
            }
            None => Ok(Box::new(BufReader::new(file))),
        }
    }
}
