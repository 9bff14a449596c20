//! Streaming SHA-1 over byte ranges of candidate files.
//!
//! Hashing runs on the blocking pool and reports progress as it reads, so
//! large disc images can be rendered with a progress bar by the caller.

use std::future::Future;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use thiserror::Error;
use tokio::sync::mpsc;

/// Chunk size for reading files (8MB)
const CHUNK_SIZE: usize = 8 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hash computation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A contiguous run of bytes within a file
///
/// `len: None` extends the range to end of file. A range that starts past
/// the end of the file, or runs beyond it, hashes only the bytes present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub len: Option<u64>,
}

impl ByteRange {
    pub const WHOLE_FILE: Self = Self {
        start: 0,
        len: None,
    };

    /// `len` bytes beginning at `start`
    #[must_use]
    pub fn window(start: u64, len: u64) -> Self {
        Self {
            start,
            len: Some(len),
        }
    }

    /// Range between two inclusive byte offsets; empty when `end < start`
    #[must_use]
    pub fn inclusive(start: u64, end: u64) -> Self {
        let len = if end < start { 0 } else { end - start + 1 };
        Self::window(start, len)
    }

    /// Inclusive offset of the last byte, or `None` when open-ended or empty
    #[must_use]
    pub fn last_byte(&self) -> Option<u64> {
        match self.len {
            Some(0) | None => None,
            Some(len) => Some(self.start + len - 1),
        }
    }
}

/// Progress update during hashing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashProgress {
    /// Bytes hashed so far
    pub bytes_processed: u64,
    /// Bytes the range is expected to cover
    pub total_bytes: u64,
    /// Progress fraction (0.0-1.0)
    pub fraction: f32,
}

/// Computes the lowercase hex content hash of a byte range
pub trait HashProvider {
    fn hash(
        &self,
        path: &Path,
        range: ByteRange,
    ) -> impl Future<Output = Result<String, HashError>> + Send;
}

/// [`HashProvider`] reading from the local file system
#[derive(Debug, Clone, Default)]
pub struct FileHasher {
    progress_tx: Option<mpsc::Sender<HashProgress>>,
}

impl FileHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report progress on `tx`; updates are dropped when the channel is full
    #[must_use]
    pub fn with_progress(tx: mpsc::Sender<HashProgress>) -> Self {
        Self {
            progress_tx: Some(tx),
        }
    }
}

impl HashProvider for FileHasher {
    async fn hash(&self, path: &Path, range: ByteRange) -> Result<String, HashError> {
        let path = path.to_path_buf();
        let progress_tx = self.progress_tx.clone();

        tokio::task::spawn_blocking(move || hash_range(&path, range, progress_tx.as_ref())).await?
    }
}

/// Hash a byte range synchronously
///
/// # Errors
///
/// Returns `HashError::Io` if the file cannot be opened, sized, seeked or read.
pub fn hash_range(
    path: &Path,
    range: ByteRange,
    progress_tx: Option<&mpsc::Sender<HashProgress>>,
) -> Result<String, HashError> {
    let io_err = |source: std::io::Error| HashError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let file_len = file.metadata().map_err(io_err)?.len();

    let available = file_len.saturating_sub(range.start);
    let total_bytes = range.len.map_or(available, |len| len.min(available));

    let mut hasher = Sha1::new();
    if total_bytes > 0 {
        file.seek(SeekFrom::Start(range.start)).map_err(io_err)?;
    }

    let buffer_len = usize::try_from(total_bytes).map_or(CHUNK_SIZE, |n| n.clamp(1, CHUNK_SIZE));
    let mut buffer = vec![0u8; buffer_len];
    let mut bytes_processed: u64 = 0;

    while bytes_processed < total_bytes {
        let wanted = usize::try_from(total_bytes - bytes_processed)
            .map_or(buffer.len(), |n| n.min(buffer.len()));
        let bytes_read = file.read(&mut buffer[..wanted]).map_err(io_err)?;
        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
        bytes_processed += bytes_read as u64;

        if let Some(tx) = progress_tx {
            let _ = tx.try_send(HashProgress {
                bytes_processed,
                total_bytes,
                fraction: bytes_processed as f32 / total_bytes as f32,
            });
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
    const ABC_SHA1: &str = "a9993e364706816aba3e25717850c26c9cd0d89d";

    fn write_temp(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_byte_range_bounds() {
        assert_eq!(ByteRange::inclusive(3, 5), ByteRange::window(3, 3));
        assert_eq!(ByteRange::inclusive(0, 0).len, Some(1));
        assert_eq!(ByteRange::window(4, 0).last_byte(), None);
        assert_eq!(ByteRange::window(4, 2).last_byte(), Some(5));
        assert_eq!(ByteRange::WHOLE_FILE.last_byte(), None);
    }

    #[test]
    fn test_hash_whole_file() {
        let file = write_temp(b"abc");
        assert_eq!(hash_range(file.path(), ByteRange::WHOLE_FILE, None).unwrap(), ABC_SHA1);

        let empty = write_temp(b"");
        assert_eq!(hash_range(empty.path(), ByteRange::WHOLE_FILE, None).unwrap(), EMPTY_SHA1);
    }

    #[test]
    fn test_hash_window_skips_header() {
        let file = write_temp(b"\x00\x00abcXYZ");
        assert_eq!(hash_range(file.path(), ByteRange::window(2, 3), None).unwrap(), ABC_SHA1);
        assert_eq!(
            hash_range(file.path(), ByteRange::inclusive(2, 4), None).unwrap(),
            ABC_SHA1
        );
    }

    #[test]
    fn test_hash_range_past_end() {
        let file = write_temp(b"abc");
        assert_eq!(hash_range(file.path(), ByteRange::window(10, 5), None).unwrap(), EMPTY_SHA1);
        assert_eq!(hash_range(file.path(), ByteRange::window(0, 100), None).unwrap(), ABC_SHA1);
    }

    #[test]
    fn test_hash_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = hash_range(&dir.path().join("missing.bin"), ByteRange::WHOLE_FILE, None);
        assert!(matches!(result, Err(HashError::Io { .. })));
    }

    #[tokio::test]
    async fn test_file_hasher_reports_progress() {
        let file = write_temp(b"abc");
        let (tx, mut rx) = mpsc::channel(16);
        let hasher = FileHasher::with_progress(tx);

        let hash = hasher.hash(file.path(), ByteRange::WHOLE_FILE).await.unwrap();
        assert_eq!(hash, ABC_SHA1);

        let progress = rx.recv().await.unwrap();
        assert_eq!(progress.bytes_processed, 3);
        assert_eq!(progress.total_bytes, 3);
        assert!((progress.fraction - 1.0).abs() < f32::EPSILON);
    }
}
