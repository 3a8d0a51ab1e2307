//! Temporary landing area for inbound uploads.
//!
//! Every byte stream is written here before anything is committed. A staged
//! file is owned by a guard that removes it when dropped, so a rejected or
//! abandoned upload never outlives the operation that created it. Only an
//! explicit [`StagedFile::mark_promoted`] after a successful relocation
//! disarms the guard.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::StorageError;
use crate::filename::{display_name, safe_extension};

const STAGED_PREFIX: &str = "temp-";

/// Removes the wrapped path on drop unless disarmed.
#[derive(Debug)]
struct TempGuard {
    path: PathBuf,
    armed: bool,
}

impl TempGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "Failed to remove staged file");
        }
    }
}

/// Private directory that receives uploads before they are validated.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
    max_size: u64,
}

impl StagingArea {
    /// Create a staging area rooted at `dir`, creating it if needed.
    pub async fn new(dir: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir, max_size })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Upper bound on the size of a single staged stream, in bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// `temp-{unix millis}-{uuid}{.ext}`; the extension is kept only if it
    /// is short and alphanumeric.
    fn temp_path(&self, original_name: &str) -> PathBuf {
        let millis = Utc::now().timestamp_millis();
        self.dir.join(format!(
            "{STAGED_PREFIX}{millis}-{}{}",
            Uuid::new_v4().simple(),
            safe_extension(original_name)
        ))
    }

    /// Open a new staged file for incremental writes.
    pub async fn begin(&self, original_name: &str) -> Result<PendingUpload, StorageError> {
        let path = self.temp_path(original_name);
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        Ok(PendingUpload {
            guard: TempGuard { path, armed: true },
            file: Some(file),
            written: 0,
            limit: self.max_size,
            original_name: display_name(original_name),
        })
    }

    /// Stage an entire reader.
    pub async fn stage<R>(
        &self,
        mut reader: R,
        original_name: &str,
    ) -> Result<StagedFile, StorageError>
    where
        R: AsyncRead + Unpin,
    {
        let mut upload = self.begin(original_name).await?;
        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            upload.write_chunk(&buf[..n]).await?;
        }

        upload.finish().await
    }

    /// Remove staged files older than `max_age`.
    ///
    /// Covers files left behind by a process that died mid-upload, when no
    /// guard got the chance to run. Returns the number of files removed.
    pub async fn purge_stale(&self, max_age: Duration) -> Result<usize, StorageError> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(STAGED_PREFIX) {
                continue;
            }

            let Some(meta) = vanished_as_none(entry.metadata().await)? else {
                continue;
            };
            let age = meta
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .unwrap_or_default();
            if !meta.is_file() || age < max_age {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        debug!(removed, "Purged stale staged files");
        Ok(removed)
    }
}

/// Treat an entry that disappeared mid-sweep as absent rather than an error.
fn vanished_as_none<T>(result: std::io::Result<T>) -> std::io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// A staged file that is still receiving bytes.
#[derive(Debug)]
pub struct PendingUpload {
    guard: TempGuard,
    file: Option<fs::File>,
    written: u64,
    limit: u64,
    original_name: String,
}

impl PendingUpload {
    /// Append a chunk, enforcing the size limit.
    ///
    /// Once the limit is crossed the partial file is removed immediately and
    /// every later call fails.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.written += chunk.len() as u64;
        if self.written > self.limit || self.file.is_none() {
            self.abort().await;
            return Err(StorageError::SizeLimitExceeded {
                actual: self.written,
                limit: self.limit,
            });
        }

        if let Some(file) = self.file.as_mut() {
            file.write_all(chunk).await?;
        }
        Ok(())
    }

    async fn abort(&mut self) {
        drop(self.file.take());
        if !self.guard.armed {
            return;
        }
        match fs::remove_file(&self.guard.path).await {
            Ok(()) => self.guard.disarm(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.guard.disarm(),
            Err(e) => {
                warn!(path = %self.guard.path.display(), error = %e, "Failed to remove oversized upload")
            }
        }
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and close the file, yielding the finished handle.
    pub async fn finish(self) -> Result<StagedFile, StorageError> {
        let PendingUpload {
            guard,
            file,
            written,
            limit,
            original_name,
        } = self;

        let Some(mut file) = file else {
            return Err(StorageError::SizeLimitExceeded {
                actual: written,
                limit,
            });
        };
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        Ok(StagedFile {
            guard,
            size: written,
            original_name,
        })
    }
}

/// A fully written staged file awaiting commit.
///
/// Dropping the handle removes the file.
#[derive(Debug)]
pub struct StagedFile {
    guard: TempGuard,
    size: u64,
    original_name: String,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.guard.path
    }

    /// Observed byte count of the staged stream.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Caller-supplied filename, reduced to a display name.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Record that the file was moved out of staging; nothing is removed.
    pub fn mark_promoted(mut self) {
        self.guard.disarm();
    }

    /// Remove the staged file now.
    pub async fn release(mut self) {
        match fs::remove_file(&self.guard.path).await {
            Ok(()) => self.guard.disarm(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.guard.disarm(),
            // Left armed so the guard retries on drop.
            Err(e) => {
                warn!(path = %self.guard.path.display(), error = %e, "Failed to release staged file")
            }
        }
    }
}
