//! Upload sink - writes proof files to the upload directory
//!
//! A file is streamed in through an [`UploadWriter`] and comes out as a
//! [`StoredUpload`]. The stored upload owns its file on disk: unless
//! [`StoredUpload::keep`] is called, dropping it removes the file again.
//! That is how a rejected order never leaves its proof file behind.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{IntakeError, IntakeResult};

/// Default per-file size limit (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Upper bound (inclusive) of the random filename suffix
const RANDOM_SUFFIX_MAX: u32 = 1_000_000_000;

/// Metadata of a file written by the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInfo {
    /// Multipart field the file arrived in
    pub field_name: String,
    /// Filename as sent by the client
    pub original_name: String,
    /// Generated name the file is stored under
    pub filename: String,
    /// Absolute path of the stored file
    pub path: PathBuf,
    /// Number of bytes written
    pub size: u64,
}

/// Writes uploads into a single directory with a size limit
#[derive(Debug, Clone)]
pub struct UploadSink {
    dir: PathBuf,
    max_bytes: u64,
}

impl UploadSink {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    /// Directory uploads are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Per-file size limit in bytes
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_dir(&self) -> IntakeResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Build a storage filename: `{field}-{unix millis}-{random}{ext}`.
    ///
    /// Unique in practice, not guaranteed: two uploads in the same
    /// millisecond must also draw the same random suffix to collide.
    pub fn generate_filename(field_name: &str, original_name: &str) -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix = rand::thread_rng().gen_range(0..=RANDOM_SUFFIX_MAX);
        format!(
            "{}-{}-{}{}",
            field_name,
            millis,
            suffix,
            extension_of(original_name)
        )
    }

    /// Open a new file for an incoming upload.
    pub async fn begin(&self, field_name: &str, original_name: &str) -> IntakeResult<UploadWriter> {
        self.ensure_dir().await?;
        let dir = tokio::fs::canonicalize(&self.dir).await?;

        let filename = Self::generate_filename(field_name, original_name);
        let path = dir.join(&filename);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        tracing::debug!(
            field = %field_name,
            original = %original_name,
            path = %path.display(),
            "Receiving upload"
        );

        Ok(UploadWriter {
            file,
            limit: self.max_bytes,
            upload: StoredUpload {
                info: UploadInfo {
                    field_name: field_name.to_string(),
                    original_name: original_name.to_string(),
                    filename,
                    path,
                    size: 0,
                },
                kept: false,
            },
        })
    }
}

/// Extension of the client filename including the dot, or empty.
///
/// Only the last path component is looked at, and extensions with
/// anything other than ASCII alphanumerics are dropped so the stored
/// name stays a plain filename.
fn extension_of(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    match Path::new(base).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => format!(".{}", ext),
        _ => String::new(),
    }
}

/// An upload being streamed to disk
///
/// Dropping the writer before [`finish`](Self::finish) removes the
/// partial file.
#[derive(Debug)]
pub struct UploadWriter {
    file: File,
    limit: u64,
    upload: StoredUpload,
}

impl UploadWriter {
    /// Append a chunk, failing once the total would exceed the limit.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> IntakeResult<()> {
        let size = self.upload.info.size + chunk.len() as u64;
        if size > self.limit {
            tracing::debug!(
                path = %self.upload.info.path.display(),
                limit = self.limit,
                "Upload exceeds size limit"
            );
            return Err(IntakeError::FileTooLarge { limit: self.limit });
        }

        self.file.write_all(chunk).await?;
        self.upload.info.size = size;
        Ok(())
    }

    /// Bytes written so far
    pub fn size(&self) -> u64 {
        self.upload.info.size
    }

    /// Flush the file and hand over ownership of the stored upload
    pub async fn finish(mut self) -> IntakeResult<StoredUpload> {
        self.file.flush().await?;
        Ok(self.upload)
    }
}

/// A file on disk that is removed on drop unless kept
#[derive(Debug)]
pub struct StoredUpload {
    info: UploadInfo,
    kept: bool,
}

impl StoredUpload {
    pub fn info(&self) -> &UploadInfo {
        &self.info
    }

    /// Retain the file on disk and return its metadata
    pub fn keep(mut self) -> UploadInfo {
        self.kept = true;
        self.info.clone()
    }
}

impl Drop for StoredUpload {
    fn drop(&mut self) {
        if self.kept {
            return;
        }

        match std::fs::remove_file(&self.info.path) {
            Ok(()) => {
                tracing::debug!(path = %self.info.path.display(), "Removed rejected upload");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.info.path.display(),
                    error = %e,
                    "Failed to remove rejected upload"
                );
            }
        }
    }
}
