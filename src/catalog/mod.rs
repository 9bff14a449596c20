//! Catalog storage, persistence and indexing.
//!
//! A catalog is the set of known-good dumps for one system, as published by
//! Redump or No-Intro. Raw XML datfiles are normalized by [`codec`] into flat
//! [`CatalogEntry`](crate::core::entry::CatalogEntry) lists, persisted by
//! [`cache`] as one JSON document per system, and held in memory by the
//! [`CatalogStore`](store::CatalogStore).
//!
//! ## Example
//!
//! ```rust
//! use dump_verifier::catalog::codec;
//! use dump_verifier::catalog::store::{CatalogStore, Scope, SystemCatalog};
//! use dump_verifier::core::types::Origin;
//!
//! let raw = br#"<datafile><header><name>Test</name></header>
//!   <game name="Empty"><rom name="Empty.iso" size="0"
//!     sha1="da39a3ee5e6b4b0d3255bfef95601890afd80709"/></game></datafile>"#;
//!
//! let entries = codec::parse(raw, Origin::Redump);
//! let mut store = CatalogStore::new();
//! store.register(SystemCatalog::from_entries(entries).unwrap());
//!
//! let hit = store.find_by_hash("da39a3ee5e6b4b0d3255bfef95601890afd80709", &Scope::AllSystems);
//! assert_eq!(hit.unwrap().name, "Empty.iso");
//! ```

pub mod cache;
pub mod codec;
pub mod index;
pub mod store;
