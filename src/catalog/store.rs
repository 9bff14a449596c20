use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::core::entry::CatalogEntry;
use crate::core::types::{Origin, SystemId};

/// Where a lookup searches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    AllSystems,
    System(SystemId),
}

/// Entry for populating a system selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemSummary {
    pub system_id: SystemId,
    pub display_name: String,
    pub entry_count: usize,
}

/// The complete entry set of one `(origin, slug)` catalog
#[derive(Debug, Clone)]
pub struct SystemCatalog {
    pub system_id: SystemId,

    /// Human-readable name shown in selectors
    pub display_name: String,

    /// All entries, in document order
    pub entries: Vec<CatalogEntry>,

    /// Index: content hash -> indices in `entries`
    hash_to_entries: HashMap<String, Vec<usize>>,
}

impl SystemCatalog {
    /// Build a catalog from parsed entries; the system is taken from the first entry
    ///
    /// Returns `None` for an empty entry list.
    #[must_use]
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Option<Self> {
        let system_id = entries.first()?.system_id.clone();
        let display_name = system_id.to_string();

        let mut hash_to_entries: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if entry.has_hash() {
                hash_to_entries
                    .entry(entry.content_hash.clone())
                    .or_default()
                    .push(idx);
            }
        }

        Some(Self {
            system_id,
            display_name,
            entries,
            hash_to_entries,
        })
    }

    /// Entries whose content hash equals `hash`, in document order
    pub fn entries_with_hash<'a>(&'a self, hash: &str) -> impl Iterator<Item = &'a CatalogEntry> {
        self.hash_to_entries
            .get(hash)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.entries[idx])
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn summary(&self) -> SystemSummary {
        SystemSummary {
            system_id: self.system_id.clone(),
            display_name: self.display_name.clone(),
            entry_count: self.entries.len(),
        }
    }
}

/// In-memory index of every loaded system catalog
///
/// Written only by ingestion and read only by verification. A system's
/// entry set is replaced wholesale on re-registration, never merged.
#[derive(Debug, Default)]
pub struct CatalogStore {
    systems: BTreeMap<SystemId, SystemCatalog>,
}

impl CatalogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a system catalog
    pub fn register(&mut self, catalog: SystemCatalog) {
        self.systems.insert(catalog.system_id.clone(), catalog);
    }

    /// Drop every system belonging to an origin
    pub fn remove_origin(&mut self, origin: Origin) -> usize {
        let before = self.systems.len();
        self.systems.retain(|id, _| id.origin() != Some(origin));
        before - self.systems.len()
    }

    #[must_use]
    pub fn get(&self, system_id: &SystemId) -> Option<&SystemCatalog> {
        self.systems.get(system_id)
    }

    /// Systems sorted by display name
    #[must_use]
    pub fn get_all_systems(&self) -> Vec<SystemSummary> {
        let mut systems: Vec<_> = self.systems.values().map(SystemCatalog::summary).collect();
        systems.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        systems
    }

    /// Entries of one system; empty for an unknown system
    #[must_use]
    pub fn get_entries(&self, system_id: &SystemId) -> &[CatalogEntry] {
        self.systems
            .get(system_id)
            .map_or(&[], |s| s.entries.as_slice())
    }

    /// First entry with the given hash in scope
    #[must_use]
    pub fn find_by_hash(&self, hash: &str, scope: &Scope) -> Option<&CatalogEntry> {
        if hash.is_empty() {
            return None;
        }
        self.systems_in(scope)
            .find_map(|s| s.entries_with_hash(hash).next())
    }

    /// Every entry with the given extension in scope
    #[must_use]
    pub fn find_by_extension(&self, ext: &str, scope: &Scope) -> Vec<&CatalogEntry> {
        self.systems_in(scope)
            .flat_map(|s| s.entries.iter())
            .filter(|e| e.extension == ext)
            .collect()
    }

    /// Entry named exactly `name` within one system
    #[must_use]
    pub fn find_by_name(&self, system_id: &SystemId, name: &str) -> Option<&CatalogEntry> {
        self.systems.get(system_id)?.find_by_name(name)
    }

    pub(crate) fn systems_in(&self, scope: &Scope) -> Box<dyn Iterator<Item = &SystemCatalog> + '_> {
        match scope {
            Scope::AllSystems => Box::new(self.systems.values()),
            Scope::System(id) => Box::new(self.systems.get(id).into_iter()),
        }
    }

    /// Number of registered systems
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Check if no system is registered
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Total entries across all systems
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.systems.values().map(|s| s.entries.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hash: &str, name: &str, system: &str) -> CatalogEntry {
        CatalogEntry::new(hash, name, SystemId::new(system), 4)
    }

    fn make_store() -> CatalogStore {
        let mut store = CatalogStore::new();
        store.register(
            SystemCatalog::from_entries(vec![
                entry(&"a".repeat(40), "Alpha (USA).iso", "redump/one"),
                entry(&"b".repeat(40), "Beta (USA).bin", "redump/one"),
                entry("", "Gamma (USA).iso", "redump/one"),
            ])
            .unwrap(),
        );
        store.register(
            SystemCatalog::from_entries(vec![entry(&"a".repeat(40), "Alpha.gb", "no-intro/two")])
                .unwrap(),
        );
        store
    }

    #[test]
    fn test_from_entries_empty() {
        assert!(SystemCatalog::from_entries(Vec::new()).is_none());
    }

    #[test]
    fn test_get_all_systems() {
        let store = make_store();
        let systems = store.get_all_systems();
        assert_eq!(systems.len(), 2);
        assert_eq!(systems[0].system_id.as_str(), "no-intro/two");
        assert_eq!(systems[1].entry_count, 3);
    }

    #[test]
    fn test_find_by_hash_scoped() {
        let store = make_store();
        let hash = "a".repeat(40);

        let found = store
            .find_by_hash(&hash, &Scope::System(SystemId::new("no-intro/two")))
            .unwrap();
        assert_eq!(found.name, "Alpha.gb");

        assert!(store
            .find_by_hash(&hash, &Scope::System(SystemId::new("redump/missing")))
            .is_none());
        assert!(store.find_by_hash(&hash, &Scope::AllSystems).is_some());
    }

    #[test]
    fn test_empty_hash_never_matches() {
        let store = make_store();
        assert!(store.find_by_hash("", &Scope::AllSystems).is_none());
    }

    #[test]
    fn test_find_by_extension() {
        let store = make_store();
        assert_eq!(store.find_by_extension("iso", &Scope::AllSystems).len(), 2);
        assert_eq!(
            store
                .find_by_extension("gb", &Scope::System(SystemId::new("redump/one")))
                .len(),
            0
        );
    }

    #[test]
    fn test_register_replaces() {
        let mut store = make_store();
        store.register(
            SystemCatalog::from_entries(vec![entry(&"c".repeat(40), "New.iso", "redump/one")])
                .unwrap(),
        );
        assert_eq!(store.get_entries(&SystemId::new("redump/one")).len(), 1);
        assert_eq!(store.entry_count(), 2);
    }

    #[test]
    fn test_remove_origin() {
        let mut store = make_store();
        assert_eq!(store.remove_origin(Origin::NoIntro), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(&SystemId::new("no-intro/two")).is_none());
    }

    #[test]
    fn test_find_by_name() {
        let store = make_store();
        let system = SystemId::new("redump/one");
        assert!(store.find_by_name(&system, "Beta (USA).bin").is_some());
        assert!(store.find_by_name(&system, "Alpha.gb").is_none());
    }
}
