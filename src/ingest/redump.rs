//! Networked ingestion of Redump catalogs.

use tracing::{debug, error, info, warn};

use crate::catalog::cache::{CacheError, DatLayout};
use crate::catalog::codec;
use crate::catalog::store::{CatalogStore, SystemCatalog};
use crate::core::types::Origin;
use crate::ingest::archive::extract_datfile;
use crate::ingest::discovery::{embedded_systems, scan_datfile_links};
use crate::ingest::fetch::Fetcher;
use crate::ingest::{IngestConfig, IngestError, IngestReport, PassRegistry};

/// Where a system catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemLoad {
    Cached { entries: usize },
    Downloaded { entries: usize },
}

/// Downloads, normalizes and caches Redump system catalogs
pub struct RedumpIngestor<'a, F: Fetcher> {
    fetcher: &'a F,
    layout: &'a DatLayout,
    config: &'a IngestConfig,
}

impl<'a, F: Fetcher> RedumpIngestor<'a, F> {
    pub fn new(fetcher: &'a F, layout: &'a DatLayout, config: &'a IngestConfig) -> Self {
        Self {
            fetcher,
            layout,
            config,
        }
    }

    /// Resolve the system slugs to ingest
    ///
    /// Scans the configured index page; if that yields nothing, falls back to
    /// the slugs cached on disk and then to the embedded list.
    pub async fn system_slugs(&self) -> Vec<String> {
        if let Some(index_url) = &self.config.index_url {
            match self
                .fetcher
                .fetch(index_url, self.config.session_cookie.as_deref())
                .await
            {
                Ok(page) => {
                    let slugs = scan_datfile_links(&String::from_utf8_lossy(&page));
                    if !slugs.is_empty() {
                        debug!("Discovered {} systems from {index_url}", slugs.len());
                        return slugs;
                    }
                    warn!("No datfile links found on {index_url}");
                }
                Err(e) => warn!("Could not read system index {index_url}: {e}"),
            }
        }

        match self.layout.cached_slugs(Origin::Redump).await {
            Ok(cached) if !cached.is_empty() => {
                debug!("Using {} cached systems", cached.len());
                cached
            }
            Ok(_) => embedded_systems(),
            Err(e) => {
                warn!("Could not list cached systems: {e}");
                embedded_systems()
            }
        }
    }

    /// Load every system into the store, downloading only what is not cached
    pub async fn run(&self, store: &mut CatalogStore) -> IngestReport {
        let slugs = self.system_slugs().await;
        self.ingest_all(&slugs, store).await
    }

    /// Load only the systems already cached on disk, without any network call
    pub async fn load_cached(&self, store: &mut CatalogStore) -> IngestReport {
        let slugs = match self.layout.cached_slugs(Origin::Redump).await {
            Ok(slugs) => slugs,
            Err(e) => {
                error!("Could not list cached systems: {e}");
                Vec::new()
            }
        };
        self.ingest_all(&slugs, store).await
    }

    async fn ingest_all(&self, slugs: &[String], store: &mut CatalogStore) -> IngestReport {
        let mut report = IngestReport::new(Origin::Redump);
        let mut registry = PassRegistry::default();
        report.total = slugs.len();

        for slug in slugs {
            let outcome = self.load_system(slug).await.and_then(|(load, catalog)| {
                registry.register(store, catalog, slug)?;
                Ok(load)
            });
            match outcome {
                Ok(SystemLoad::Cached { entries }) => {
                    report.loaded += 1;
                    info!("Loaded cached catalog {slug} ({entries} entries)");
                }
                Ok(SystemLoad::Downloaded { entries }) => {
                    report.loaded += 1;
                    info!(
                        "Downloaded catalog {slug} from {} ({entries} entries)",
                        self.config.datfile_url(slug)
                    );
                }
                Err(e @ IngestError::Decode { .. }) => {
                    report.total = report.total.saturating_sub(1);
                    warn!("Skipping {slug}: {e}");
                    report.skip(slug, &e);
                }
                Err(e) => {
                    error!("Skipping {slug}: {e}");
                    report.skip(slug, &e);
                }
            }
        }

        info!(
            "Loaded {}/{} {} catalogs",
            report.loaded,
            report.total,
            Origin::Redump
        );
        report
    }

    /// Delete every cached Redump catalog and ingest again from the network
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the cache directory cannot be purged.
    pub async fn refresh(&self, store: &mut CatalogStore) -> Result<IngestReport, CacheError> {
        let removed = self.layout.purge(Origin::Redump).await?;
        store.remove_origin(Origin::Redump);
        info!("Purged {removed} cached {} files", Origin::Redump);
        Ok(self.run(store).await)
    }

    /// Load one system, from the cache if present, otherwise from the network
    ///
    /// # Errors
    ///
    /// Returns the `IngestError` of the first failing stage; nothing is
    /// written to the cache or the store in that case.
    pub async fn ingest_system(
        &self,
        slug: &str,
        store: &mut CatalogStore,
    ) -> Result<SystemLoad, IngestError> {
        let (load, catalog) = self.load_system(slug).await?;
        store.register(catalog);
        Ok(load)
    }

    async fn load_system(&self, slug: &str) -> Result<(SystemLoad, SystemCatalog), IngestError> {
        let persistence = |source: CacheError| IngestError::Persistence {
            name: slug.to_string(),
            source,
        };

        if self.layout.has_normalized(Origin::Redump, slug).await {
            let path = self.layout.normalized_path(Origin::Redump, slug);
            let entries = self
                .layout
                .read_normalized(&path)
                .await
                .map_err(persistence)?;
            let catalog = SystemCatalog::from_entries(entries).ok_or_else(|| IngestError::Parse {
                document: path.display().to_string(),
            })?;
            let entries = catalog.entries.len();
            return Ok((SystemLoad::Cached { entries }, catalog));
        }

        let url = self.config.datfile_url(slug);
        let archive = self
            .fetcher
            .fetch(&url, self.config.session_cookie.as_deref())
            .await
            .map_err(|source| IngestError::Transport {
                url: url.clone(),
                source,
            })?;

        let document = extract_datfile(&archive).map_err(|source| IngestError::Decode {
            url: url.clone(),
            source,
        })?;

        let entries = codec::parse(&document, Origin::Redump);
        if entries.is_empty() {
            return Err(IngestError::Parse { document: url });
        }

        self.layout
            .write_normalized(Origin::Redump, slug, &entries)
            .await
            .map_err(persistence)?;

        let catalog = SystemCatalog::from_entries(entries)
            .ok_or(IngestError::Parse { document: url })?;
        let entries = catalog.entries.len();
        Ok((SystemLoad::Downloaded { entries }, catalog))
    }
}
