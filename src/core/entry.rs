use serde::{Deserialize, Serialize};

use crate::core::types::SystemId;
use crate::utils::validation::extension_of;

/// One known-good dump variant from a catalog
///
/// Serialized field names follow the normalized cache format
/// (`sha1`, `name`, `extension`, `system`, `size`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Lowercase hex SHA-1 of the exact byte range; empty when the catalog omitted it
    #[serde(rename = "sha1")]
    pub content_hash: String,

    /// Human-readable title of the dump, including its file extension
    pub name: String,

    /// Lowercase extension of `name` without the dot
    pub extension: String,

    /// Owning system, e.g. `redump/sony-playstation`
    #[serde(rename = "system")]
    pub system_id: SystemId,

    /// Length of the byte range that produces `content_hash`
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

impl CatalogEntry {
    pub fn new(
        content_hash: impl Into<String>,
        name: impl Into<String>,
        system_id: SystemId,
        size_bytes: u64,
    ) -> Self {
        let name = name.into();
        Self {
            content_hash: content_hash.into(),
            extension: extension_of(&name),
            name,
            system_id,
            size_bytes,
        }
    }

    /// Entries without a hash can never match by exact lookup
    #[must_use]
    pub fn has_hash(&self) -> bool {
        !self.content_hash.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_derived_from_name() {
        let entry = CatalogEntry::new("", "Game (Track 1).BIN", SystemId::new("redump/psx"), 10);
        assert_eq!(entry.extension, "bin");
        assert!(!entry.has_hash());
    }

    #[test]
    fn test_serialized_field_names() {
        let entry = CatalogEntry::new(
            "da39a3ee5e6b4b0d3255bfef95601890afd80709",
            "Empty.iso",
            SystemId::new("redump/test"),
            0,
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"sha1":"da39a3ee5e6b4b0d3255bfef95601890afd80709","name":"Empty.iso","extension":"iso","system":"redump/test","size":0}"#
        );
    }
}
