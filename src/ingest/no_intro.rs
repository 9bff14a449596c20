//! Offline ingestion of No-Intro catalogs.
//!
//! No-Intro datfiles cannot be downloaded without an account, so they are
//! supplied by the user. A pass normalizes every raw `.dat` lacking a
//! matching `.json`, deletes the raw file, then loads the remaining
//! normalized catalogs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::catalog::cache::{CacheError, DatLayout, NORMALIZED_EXT, RAW_EXT};
use crate::catalog::codec;
use crate::catalog::store::{CatalogStore, SystemCatalog};
use crate::core::types::Origin;
use crate::ingest::{IngestError, IngestReport, PassRegistry};

pub struct NoIntroIngestor<'a> {
    layout: &'a DatLayout,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl<'a> NoIntroIngestor<'a> {
    pub fn new(layout: &'a DatLayout) -> Self {
        Self { layout }
    }

    /// Normalize pending raw datfiles and load every normalized catalog
    ///
    /// `total` in the report is the number of normalized files present after
    /// normalization. A file describing a system that an earlier file of the
    /// same pass already provided is skipped as a duplicate.
    pub async fn run(&self, store: &mut CatalogStore) -> IngestReport {
        let mut report = IngestReport::new(Origin::NoIntro);
        let mut registry = PassRegistry::default();
        let mut fresh: HashSet<PathBuf> = HashSet::new();

        let raw_files = match self.layout.list(Origin::NoIntro, RAW_EXT).await {
            Ok(files) => files,
            Err(e) => {
                error!("Could not list raw {} datfiles: {e}", Origin::NoIntro);
                Vec::new()
            }
        };

        for raw in &raw_files {
            let stem = file_stem(raw);
            if self.layout.has_normalized(Origin::NoIntro, &stem).await {
                continue;
            }
            let outcome = self.normalize(raw, &stem).await.and_then(|(path, catalog)| {
                fresh.insert(path);
                registry.register(store, catalog, &file_name(raw))
            });
            match outcome {
                Ok(entries) => {
                    info!("Parsed datfile {} ({entries} entries)", file_name(raw));
                    report.loaded += 1;
                }
                Err(e) => {
                    error!("Skipping {}: {e}", file_name(raw));
                    report.skip(&file_name(raw), &e);
                }
            }
        }

        let normalized = match self.layout.list(Origin::NoIntro, NORMALIZED_EXT).await {
            Ok(files) => files,
            Err(e) => {
                error!("Could not list {} catalogs: {e}", Origin::NoIntro);
                Vec::new()
            }
        };
        report.total = normalized.len();

        for path in normalized.iter().filter(|p| !fresh.contains(*p)) {
            let outcome = self
                .load(path)
                .await
                .and_then(|catalog| registry.register(store, catalog, &file_name(path)));
            match outcome {
                Ok(entries) => {
                    info!("Loaded catalog {} ({entries} entries)", file_name(path));
                    report.loaded += 1;
                }
                Err(e) => {
                    error!("Skipping {}: {e}", file_name(path));
                    report.skip(&file_name(path), &e);
                }
            }
        }

        info!(
            "Loaded {}/{} {} catalogs",
            report.loaded,
            report.total,
            Origin::NoIntro
        );
        report
    }

    /// Replace the No-Intro catalogs with user-supplied datfiles
    ///
    /// With at least one path, every existing No-Intro file is purged, each
    /// `.dat` is copied into the origin directory under a sanitized name and
    /// a normal pass follows. Files that are not `.dat` are reported and
    /// skipped. An empty selection changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the origin directory cannot be purged.
    pub async fn import(
        &self,
        paths: &[PathBuf],
        store: &mut CatalogStore,
    ) -> Result<IngestReport, CacheError> {
        if paths.is_empty() {
            return Ok(IngestReport::new(Origin::NoIntro));
        }

        let removed = self.layout.purge(Origin::NoIntro).await?;
        store.remove_origin(Origin::NoIntro);
        info!("Purged {removed} {} files", Origin::NoIntro);

        let mut rejected = Vec::new();
        for path in paths {
            let is_dat = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(RAW_EXT));
            let outcome = if is_dat {
                self.layout
                    .import_raw(Origin::NoIntro, path)
                    .await
                    .map_err(|e| e.to_string())
            } else {
                Err(format!("not a .{RAW_EXT} file"))
            };

            if let Err(reason) = outcome {
                let e = IngestError::Import {
                    path: path.clone(),
                    reason,
                };
                warn!("{e}");
                rejected.push((file_name(path), e));
            }
        }

        let mut report = self.run(store).await;
        for (name, e) in &rejected {
            report.skip(name, e);
        }
        Ok(report)
    }

    async fn normalize(
        &self,
        raw: &Path,
        stem: &str,
    ) -> Result<(PathBuf, SystemCatalog), IngestError> {
        let persistence = |source: CacheError| IngestError::Persistence {
            name: file_name(raw),
            source,
        };

        let document = tokio::fs::read(raw).await.map_err(|e| {
            persistence(CacheError::Io {
                path: raw.to_path_buf(),
                source: e,
            })
        })?;

        let entries = codec::parse(&document, Origin::NoIntro);
        if entries.is_empty() {
            if let Err(e) = self.layout.remove(raw).await {
                warn!("Could not delete unparseable datfile: {e}");
            }
            return Err(IngestError::Parse {
                document: file_name(raw),
            });
        }

        // On failure the raw file is kept for the next pass.
        let path = self
            .layout
            .write_normalized(Origin::NoIntro, stem, &entries)
            .await
            .map_err(persistence)?;

        if let Err(e) = self.layout.remove(raw).await {
            warn!("Could not delete normalized datfile: {e}");
        }

        let catalog = SystemCatalog::from_entries(entries).ok_or_else(|| IngestError::Parse {
            document: file_name(raw),
        })?;
        Ok((path, catalog))
    }

    async fn load(&self, path: &Path) -> Result<SystemCatalog, IngestError> {
        let entries = self
            .layout
            .read_normalized(path)
            .await
            .map_err(|source| IngestError::Persistence {
                name: file_name(path),
                source,
            })?;
        SystemCatalog::from_entries(entries).ok_or_else(|| IngestError::Parse {
            document: file_name(path),
        })
    }
}
