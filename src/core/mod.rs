//! Core data types for dump verification.
//!
//! - [`CatalogEntry`]: one known-good dump (hash, name, extension, system, size)
//! - [`Origin`]: where catalog data comes from (networked Redump or imported No-Intro)
//! - [`SystemId`]: composite `origin/slug` key of a system catalog
//!
//! [`CatalogEntry`]: entry::CatalogEntry
//! [`Origin`]: types::Origin
//! [`SystemId`]: types::SystemId

pub mod entry;
pub mod types;
