use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use crate::range::ByteRange;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Durable storage for committed asset files.
///
/// Paths are relative to the store root and use `/` as separator.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Relocate a file from outside the store to `dst`.
    ///
    /// The existence check and the placement are one atomic step, so a file
    /// already at `dst` is never overwritten and the call fails with
    /// [`StorageError::AlreadyExists`]. On failure `src` is left in place and
    /// nothing new is left at `dst`.
    async fn move_into(&self, src: &Path, dst: &str) -> Result<(), StorageError>;

    /// Remove the file at `path`.
    ///
    /// Returns `true` if the file was removed, `false` if it did not exist.
    async fn remove(&self, path: &str) -> Result<bool, StorageError>;

    /// Check whether a file exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Size of the file at `path` in bytes.
    async fn size(&self, path: &str) -> Result<u64, StorageError>;

    /// Open the file for reading, limited to `range` when one is given.
    async fn open_range(
        &self,
        path: &str,
        range: Option<ByteRange>,
    ) -> Result<BoxReader, StorageError>;

    /// Read the whole file into memory.
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open_range(path, None).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}
