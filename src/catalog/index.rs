use crate::core::entry::CatalogEntry;
use crate::core::types::SystemId;

use super::store::{CatalogStore, Scope};

/// Finds the catalog entry a computed hash identifies
pub struct CandidateFinder<'a> {
    store: &'a CatalogStore,
}

impl<'a> CandidateFinder<'a> {
    pub fn new(store: &'a CatalogStore) -> Self {
        Self { store }
    }

    /// Exact hash lookup, optionally restricted to entries with a given extension
    ///
    /// Entries without a hash never match.
    pub fn find_exact(
        &self,
        hash: &str,
        extension: Option<&str>,
        scope: &Scope,
    ) -> Option<&'a CatalogEntry> {
        if hash.is_empty() {
            return None;
        }

        match extension {
            None => self.store.find_by_hash(hash, scope),
            Some(ext) => self
                .store
                .systems_in(scope)
                .flat_map(|s| s.entries_with_hash(hash))
                .find(|e| e.extension == ext),
        }
    }

    /// Entry selected by name within one system (the explicit game hint)
    pub fn find_game(&self, system_id: &SystemId, name: &str) -> Option<&'a CatalogEntry> {
        self.store.find_by_name(system_id, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::SystemCatalog;

    fn make_store() -> CatalogStore {
        let hash = "f".repeat(40);
        let mut store = CatalogStore::new();
        store.register(
            SystemCatalog::from_entries(vec![CatalogEntry::new(
                hash.clone(),
                "Disc.iso",
                SystemId::new("redump/a"),
                1,
            )])
            .unwrap(),
        );
        store.register(
            SystemCatalog::from_entries(vec![CatalogEntry::new(
                hash,
                "Setup.exe",
                SystemId::new("redump/b"),
                1,
            )])
            .unwrap(),
        );
        store
    }

    #[test]
    fn test_extension_filter_selects_across_systems() {
        let store = make_store();
        let finder = CandidateFinder::new(&store);
        let hash = "f".repeat(40);

        let exe = finder
            .find_exact(&hash, Some("exe"), &Scope::AllSystems)
            .unwrap();
        assert_eq!(exe.system_id.as_str(), "redump/b");

        assert!(finder
            .find_exact(&hash, Some("cue"), &Scope::AllSystems)
            .is_none());
    }

    #[test]
    fn test_without_extension_filter() {
        let store = make_store();
        let finder = CandidateFinder::new(&store);
        let hash = "f".repeat(40);

        let found = finder
            .find_exact(&hash, None, &Scope::System(SystemId::new("redump/b")))
            .unwrap();
        assert_eq!(found.name, "Setup.exe");
        assert!(finder.find_exact("", None, &Scope::AllSystems).is_none());
    }

    #[test]
    fn test_find_game() {
        let store = make_store();
        let finder = CandidateFinder::new(&store);
        assert!(finder
            .find_game(&SystemId::new("redump/a"), "Disc.iso")
            .is_some());
        assert!(finder
            .find_game(&SystemId::new("redump/a"), "Setup.exe")
            .is_none());
    }
}
