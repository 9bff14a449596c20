//! Catalog ingestion.
//!
//! Two pipelines fill the [`CatalogStore`](crate::catalog::store::CatalogStore):
//!
//! - [`redump`]: networked. Each system is downloaded once as a zipped
//!   datfile, normalized and cached; later runs load the cache without
//!   touching the network.
//! - [`no_intro`]: offline. Raw datfiles placed in the origin directory
//!   (usually through [`no_intro::NoIntroIngestor::import`]) are normalized
//!   on the next pass and then deleted.
//!
//! A failure on one system never aborts the pass; it is logged and recorded
//! in the [`IngestReport`].

pub mod archive;
pub mod discovery;
pub mod fetch;
pub mod no_intro;
pub mod redump;

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::cache::CacheError;
use crate::catalog::store::{CatalogStore, SystemCatalog};
use crate::core::types::{Origin, SystemId};
use archive::ArchiveError;
use fetch::FetchError;

pub const DEFAULT_INDEX_URL: &str = "http://redump.org/downloads/";
pub const DEFAULT_DATFILE_BASE_URL: &str = "http://redump.org/datfile/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("No datfile could be extracted from {url} (the system may require a session cookie): {source}")]
    Decode {
        url: String,
        #[source]
        source: ArchiveError,
    },

    #[error("No rom entries could be parsed from {document}")]
    Parse { document: String },

    #[error("Failed to persist catalog {name}: {source}")]
    Persistence {
        name: String,
        #[source]
        source: CacheError,
    },

    #[error("Rejected import of {}: {reason}", path.display())]
    Import { path: PathBuf, reason: String },

    #[error("{document} describes {system_id}, which another catalog already provided")]
    Duplicate {
        document: String,
        system_id: SystemId,
    },
}

/// Coarse classification of [`IngestError`] for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Transport,
    Decode,
    Parse,
    Persistence,
    Import,
    Duplicate,
}

impl IngestError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transport,
            Self::Decode { .. } => FailureKind::Decode,
            Self::Parse { .. } => FailureKind::Parse,
            Self::Persistence { .. } => FailureKind::Persistence,
            Self::Import { .. } => FailureKind::Import,
            Self::Duplicate { .. } => FailureKind::Duplicate,
        }
    }
}

/// Settings for the networked pipeline
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Page scanned for `/datfile/<slug>/` links; `None` skips discovery
    pub index_url: Option<String>,

    /// Prefix that a system slug is appended to
    pub datfile_base_url: String,

    /// Opaque session cookie sent with every request when present
    pub session_cookie: Option<String>,

    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            index_url: Some(DEFAULT_INDEX_URL.to_string()),
            datfile_base_url: DEFAULT_DATFILE_BASE_URL.to_string(),
            session_cookie: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn datfile_url(&self, slug: &str) -> String {
        let base = self.datfile_base_url.trim_end_matches('/');
        format!("{base}/{slug}/")
    }
}

/// A system that could not be loaded during a pass
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSystem {
    pub name: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Outcome of one ingestion pass
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub origin: Origin,
    pub loaded: usize,

    /// Systems expected to load. Systems whose download could not be decoded
    /// (typically gated behind a login) are not counted.
    pub total: usize,

    pub skipped: Vec<SkippedSystem>,
}

impl IngestReport {
    #[must_use]
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            loaded: 0,
            total: 0,
            skipped: Vec::new(),
        }
    }

    pub(crate) fn skip(&mut self, name: &str, error: &IngestError) {
        self.skipped.push(SkippedSystem {
            name: name.to_string(),
            kind: error.kind(),
            reason: error.to_string(),
        });
    }

    /// Number of skipped systems of a given kind
    #[must_use]
    pub fn count(&self, kind: FailureKind) -> usize {
        self.skipped.iter().filter(|s| s.kind == kind).count()
    }
}

/// Store registrations made during one pass
///
/// Catalogs are keyed by the system their header names, so two documents
/// may resolve to the same id. The first one registered in a pass wins.
#[derive(Debug, Default)]
pub(crate) struct PassRegistry {
    registered: HashSet<SystemId>,
}

impl PassRegistry {
    /// Register `catalog`, refusing a system already registered in this pass
    pub(crate) fn register(
        &mut self,
        store: &mut CatalogStore,
        catalog: SystemCatalog,
        document: &str,
    ) -> Result<usize, IngestError> {
        if !self.registered.insert(catalog.system_id.clone()) {
            return Err(IngestError::Duplicate {
                document: document.to_string(),
                system_id: catalog.system_id,
            });
        }
        let entries = catalog.entries.len();
        store.register(catalog);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datfile_url() {
        let config = IngestConfig::default();
        assert_eq!(config.datfile_url("psx"), "http://redump.org/datfile/psx/");

        let config = IngestConfig {
            datfile_base_url: "http://mirror.local/dat".to_string(),
            ..IngestConfig::default()
        };
        assert_eq!(config.datfile_url("ps2"), "http://mirror.local/dat/ps2/");
    }

    #[test]
    fn test_report_counts_by_kind() {
        let mut report = IngestReport::new(Origin::Redump);
        report.skip(
            "psx",
            &IngestError::Parse {
                document: "psx".to_string(),
            },
        );
        report.skip(
            "ps2",
            &IngestError::Import {
                path: PathBuf::from("ps2.txt"),
                reason: "not a datfile".to_string(),
            },
        );
        assert_eq!(report.count(FailureKind::Parse), 1);
        assert_eq!(report.count(FailureKind::Decode), 0);
        assert_eq!(report.skipped[1].reason, "Rejected import of ps2.txt: not a datfile");
    }

    #[test]
    fn test_pass_registry_refuses_second_catalog_for_a_system() {
        use crate::core::entry::CatalogEntry;

        let catalog = |hash: &str, name: &str| {
            SystemCatalog::from_entries(vec![CatalogEntry::new(
                hash,
                name,
                SystemId::new("no-intro/nintendo-game-boy"),
                1,
            )])
            .unwrap()
        };

        let mut store = CatalogStore::new();
        let mut registry = PassRegistry::default();
        assert_eq!(
            registry
                .register(&mut store, catalog(&"a".repeat(40), "A.gb"), "GB (2024).dat")
                .unwrap(),
            1
        );

        let err = registry
            .register(&mut store, catalog(&"b".repeat(40), "B.gb"), "GB (2025).dat")
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Duplicate);
        assert!(err.to_string().starts_with("GB (2025).dat describes no-intro/nintendo-game-boy"));

        let system = SystemId::new("no-intro/nintendo-game-boy");
        assert_eq!(store.get_entries(&system)[0].name, "A.gb");

        // A new pass may replace what an earlier pass registered
        let mut next_pass = PassRegistry::default();
        next_pass
            .register(&mut store, catalog(&"b".repeat(40), "B.gb"), "GB (2025).dat")
            .unwrap();
        assert_eq!(store.get_entries(&system)[0].name, "B.gb");
    }
}
