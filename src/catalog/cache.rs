//! On-disk layout of raw and normalized catalogs.
//!
//! ```text
//! <data-dir>/dat/redump/<slug>.json     normalized catalogs
//! <data-dir>/dat/no-intro/<name>.dat    raw datfiles waiting to be normalized
//! <data-dir>/dat/no-intro/<name>.json
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::catalog::codec::{self, CodecError};
use crate::core::entry::CatalogEntry;
use crate::core::types::Origin;
use crate::utils::validation::{validate_filename, ValidationError};

/// Suffix of normalized catalog files
pub const NORMALIZED_EXT: &str = "json";

/// Suffix of raw datfiles
pub const RAW_EXT: &str = "dat";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid normalized catalog {}: {source}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("Rejected file name: {0}")]
    FileName(#[from] ValidationError),

    #[error("Cache task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Directory layout rooted at `<data-dir>/dat`
#[derive(Debug, Clone)]
pub struct DatLayout {
    root: PathBuf,
}

impl DatLayout {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join("dat"),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn origin_dir(&self, origin: Origin) -> PathBuf {
        self.root.join(origin.as_str())
    }

    #[must_use]
    pub fn normalized_path(&self, origin: Origin, slug: &str) -> PathBuf {
        self.origin_dir(origin)
            .join(format!("{slug}.{NORMALIZED_EXT}"))
    }

    /// Create the per-origin directories if missing
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if a directory cannot be created.
    pub async fn ensure(&self) -> Result<(), CacheError> {
        for origin in Origin::ALL {
            let dir = self.origin_dir(origin);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| CacheError::io(&dir, e))?;
        }
        Ok(())
    }

    pub async fn has_normalized(&self, origin: Origin, slug: &str) -> bool {
        tokio::fs::try_exists(self.normalized_path(origin, slug))
            .await
            .unwrap_or(false)
    }

    /// Files in the origin directory with the given suffix, sorted by name
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the directory cannot be read.
    pub async fn list(&self, origin: Origin, ext: &str) -> Result<Vec<PathBuf>, CacheError> {
        let dir = self.origin_dir(origin);
        let mut files = Vec::new();

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(CacheError::io(&dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&dir, e))?
        {
            let path = entry.path();
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext));
            if is_file && matches_ext {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Slugs of every normalized catalog cached for an origin
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the directory cannot be read.
    pub async fn cached_slugs(&self, origin: Origin) -> Result<Vec<String>, CacheError> {
        Ok(self
            .list(origin, NORMALIZED_EXT)
            .await?
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect())
    }

    /// Load a normalized catalog file
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the file cannot be read or
    /// `CacheError::Codec` if it is not a valid entry array.
    pub async fn read_normalized(&self, path: &Path) -> Result<Vec<CatalogEntry>, CacheError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CacheError::io(path, e))?;
        codec::deserialize(&bytes).map_err(|source| CacheError::Codec {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Persist a normalized catalog, replacing any previous file atomically
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Codec` if serialization fails or `CacheError::Io`
    /// if the temp file cannot be written or renamed into place.
    pub async fn write_normalized(
        &self,
        origin: Origin,
        slug: &str,
        entries: &[CatalogEntry],
    ) -> Result<PathBuf, CacheError> {
        let path = self.normalized_path(origin, slug);
        let bytes = codec::serialize(entries).map_err(|source| CacheError::Codec {
            path: path.clone(),
            source,
        })?;
        let dir = self.origin_dir(origin);

        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), CacheError> {
            use std::io::Write;

            std::fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
            let mut tmp =
                tempfile::NamedTempFile::new_in(&dir).map_err(|e| CacheError::io(&dir, e))?;
            tmp.write_all(&bytes)
                .and_then(|()| tmp.as_file().sync_all())
                .map_err(|e| CacheError::io(tmp.path(), e))?;
            tmp.persist(&target)
                .map_err(|e| CacheError::io(&target, e.error))?;
            Ok(())
        })
        .await??;

        debug!("Wrote {} entries to {}", entries.len(), path.display());
        Ok(path)
    }

    /// # Errors
    ///
    /// Returns `CacheError::Io` if the file cannot be deleted.
    pub async fn remove(&self, path: &Path) -> Result<(), CacheError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| CacheError::io(path, e))
    }

    /// Delete every regular file in the origin directory, leaving subdirectories
    ///
    /// Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` on the first file that cannot be deleted.
    pub async fn purge(&self, origin: Origin) -> Result<usize, CacheError> {
        let dir = self.origin_dir(origin);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::io(&dir, e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&dir, e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if is_file {
                self.remove(&entry.path()).await?;
                removed += 1;
            }
        }

        debug!("Purged {removed} files from {}", dir.display());
        Ok(removed)
    }

    /// Copy a user-supplied raw datfile into the origin directory
    ///
    /// # Errors
    ///
    /// Returns `CacheError::FileName` if the source has an unsafe name or
    /// `CacheError::Io` if the copy fails.
    pub async fn import_raw(&self, origin: Origin, source: &Path) -> Result<PathBuf, CacheError> {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_name = validate_filename(&file_name)?;

        let dir = self.origin_dir(origin);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::io(&dir, e))?;

        let dest = dir.join(file_name);
        tokio::fs::copy(source, &dest)
            .await
            .map_err(|e| CacheError::io(source, e))?;
        Ok(dest)
    }
}
