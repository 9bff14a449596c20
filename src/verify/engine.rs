use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::index::CandidateFinder;
use crate::catalog::store::{CatalogStore, Scope};
use crate::core::entry::CatalogEntry;
use crate::core::types::SystemId;
use crate::utils::validation::extension_of;
use crate::verify::hashing::{ByteRange, HashProvider};

/// Number of leading header lengths probed by the offset scan (0..=19)
pub const DEFAULT_MAX_OFFSET: u64 = 20;

/// System whose dumps may carry a header before the hashed payload
pub const DEFAULT_MULTI_OFFSET_SYSTEM: &str = "redump/sony-playstation";

/// Extension of raw disc tracks that may carry a header
pub const DEFAULT_RAW_TRACK_EXTENSION: &str = "bin";

/// Configuration for verification
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Offsets `0..max_offset` are probed when a game is selected
    pub max_offset: u64,

    /// Files from this system are probed at every offset regardless of extension
    pub multi_offset_system: SystemId,

    /// Files with this extension are probed at every offset
    pub raw_track_extension: String,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            max_offset: DEFAULT_MAX_OFFSET,
            multi_offset_system: SystemId::new(DEFAULT_MULTI_OFFSET_SYSTEM),
            raw_track_extension: DEFAULT_RAW_TRACK_EXTENSION.to_string(),
        }
    }
}

/// Files to verify, with optional hints narrowing the search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationRequest {
    pub file_paths: Vec<PathBuf>,

    #[serde(default)]
    pub system_hint: Option<SystemId>,

    /// Only used together with `system_hint`
    #[serde(default)]
    pub game_hint: Option<String>,
}

impl VerificationRequest {
    pub fn new(file_paths: Vec<PathBuf>) -> Self {
        Self {
            file_paths,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_system(mut self, system_id: SystemId) -> Self {
        self.system_hint = Some(system_id);
        self
    }

    #[must_use]
    pub fn with_game(mut self, name: impl Into<String>) -> Self {
        self.game_hint = Some(name.into());
        self
    }
}

/// Verdict for a single file
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub path: PathBuf,

    /// SHA-1 of the hashed bytes: the whole file for a plain lookup, the
    /// matching window for an offset match, or the last probed window when
    /// an offset scan misses. `None` when the file could not be read or no
    /// window was probed.
    pub computed_hash: Option<String>,

    pub matched: bool,
    pub matched_entry: Option<CatalogEntry>,

    /// Header length skipped to obtain the match
    pub matched_offset: Option<u64>,
}

impl VerificationOutcome {
    fn no_match(path: &Path, computed_hash: Option<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            computed_hash,
            matched: false,
            matched_entry: None,
            matched_offset: None,
        }
    }

    fn matched(path: &Path, hash: String, entry: CatalogEntry, offset: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            computed_hash: Some(hash),
            matched: true,
            matched_entry: Some(entry),
            matched_offset: Some(offset),
        }
    }
}

/// Per-file outcomes of a run with its tally
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub outcomes: Vec<VerificationOutcome>,
    pub successful: usize,
    pub total: usize,
    pub finished_at: DateTime<Utc>,
}

/// Matches candidate files against the loaded catalogs
///
/// Files are processed one at a time in request order; a file that cannot
/// be read becomes a no-match and the run continues.
pub struct VerificationEngine<'a, H: HashProvider> {
    finder: CandidateFinder<'a>,
    hasher: &'a H,
    config: VerifyConfig,
}

impl<'a, H: HashProvider> VerificationEngine<'a, H> {
    pub fn new(store: &'a CatalogStore, hasher: &'a H) -> Self {
        Self::with_config(store, hasher, VerifyConfig::default())
    }

    pub fn with_config(store: &'a CatalogStore, hasher: &'a H, config: VerifyConfig) -> Self {
        Self {
            finder: CandidateFinder::new(store),
            hasher,
            config,
        }
    }

    pub async fn verify(&self, request: &VerificationRequest) -> VerificationReport {
        if request.game_hint.is_some() && request.system_hint.is_none() {
            warn!("Ignoring game selection without a system selection");
        }

        let mut outcomes = Vec::with_capacity(request.file_paths.len());
        let mut successful = 0;

        for path in &request.file_paths {
            let outcome = self.verify_file(path, request).await;
            match &outcome.matched_entry {
                Some(entry) => {
                    successful += 1;
                    info!("{} matches \"{}\" ({})", path.display(), entry.name, entry.system_id);
                }
                None if outcome.computed_hash.is_none() => {
                    warn!("{} could not be hashed", path.display());
                }
                None => info!("{} has no match", path.display()),
            }
            outcomes.push(outcome);
        }

        let total = outcomes.len();
        info!("Verified {successful}/{total} files");

        VerificationReport {
            outcomes,
            successful,
            total,
            finished_at: Utc::now(),
        }
    }

    /// Verify one file against the request's hints
    pub async fn verify_file(
        &self,
        path: &Path,
        request: &VerificationRequest,
    ) -> VerificationOutcome {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = extension_of(&file_name);

        match (&request.system_hint, &request.game_hint) {
            (Some(system_id), Some(game)) => match self.finder.find_game(system_id, game) {
                Some(entry) => self.scan_offsets(path, &extension, system_id, entry).await,
                None => {
                    debug!("No game named \"{game}\" in {system_id}");
                    VerificationOutcome::no_match(path, None)
                }
            },
            (system_hint, _) => self.lookup_whole_file(path, &extension, system_hint.as_ref()).await,
        }
    }

    /// Whether a file is probed beyond offset 0
    #[must_use]
    pub fn probes_all_offsets(&self, extension: &str, system_id: &SystemId) -> bool {
        extension == self.config.raw_track_extension || *system_id == self.config.multi_offset_system
    }

    async fn scan_offsets(
        &self,
        path: &Path,
        extension: &str,
        system_id: &SystemId,
        entry: &CatalogEntry,
    ) -> VerificationOutcome {
        let all_offsets = self.probes_all_offsets(extension, system_id);
        let mut last_hash = None;

        for offset in 0..self.config.max_offset {
            let range = ByteRange::window(offset, entry.size_bytes);
            let hash = match self.hasher.hash(path, range).await {
                Ok(hash) => hash,
                Err(e) => {
                    warn!("Hashing failed at offset {offset}: {e}");
                    return VerificationOutcome::no_match(path, None);
                }
            };

            if entry.has_hash() && hash == entry.content_hash {
                return VerificationOutcome::matched(path, hash, entry.clone(), offset);
            }
            last_hash = Some(hash);

            if !all_offsets {
                break;
            }
        }

        VerificationOutcome::no_match(path, last_hash)
    }

    async fn lookup_whole_file(
        &self,
        path: &Path,
        extension: &str,
        system_hint: Option<&SystemId>,
    ) -> VerificationOutcome {
        let hash = match self.hasher.hash(path, ByteRange::WHOLE_FILE).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Hashing failed: {e}");
                return VerificationOutcome::no_match(path, None);
            }
        };

        let found = match system_hint {
            Some(system_id) => {
                self.finder
                    .find_exact(&hash, None, &Scope::System(system_id.clone()))
            }
            None => self
                .finder
                .find_exact(&hash, Some(extension), &Scope::AllSystems),
        };

        match found {
            Some(entry) => VerificationOutcome::matched(path, hash, entry.clone(), 0),
            None => VerificationOutcome::no_match(path, Some(hash)),
        }
    }
}
