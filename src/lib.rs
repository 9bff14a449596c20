//! # dump-verifier
//!
//! A library for checking that a dump of physical game media is byte-identical
//! to a known-good reference, using the hashes and sizes published by Redump
//! and No-Intro rather than the reference files themselves.
//!
//! ## Features
//!
//! - **Catalog ingestion**: Downloads zipped Redump datfiles once, imports
//!   No-Intro datfiles from disk, and keeps a normalized JSON cache
//! - **Exact matching**: Whole-file SHA-1 lookup, filtered by extension when
//!   no system is selected
//! - **Header offset probing**: Recovers raw tracks whose payload is preceded
//!   by a header of up to 19 bytes
//! - **Per-item failure isolation**: One unreadable file or unreachable system
//!   never aborts a pass
//!
//! ## Example
//!
//! ```rust,no_run
//! use dump_verifier::catalog::cache::DatLayout;
//! use dump_verifier::ingest::no_intro::NoIntroIngestor;
//! use dump_verifier::{CatalogStore, FileHasher, VerificationEngine, VerificationRequest};
//!
//! # async fn demo() {
//! let layout = DatLayout::new("/var/lib/dump-verifier");
//! let mut store = CatalogStore::new();
//! NoIntroIngestor::new(&layout).run(&mut store).await;
//!
//! let hasher = FileHasher::new();
//! let engine = VerificationEngine::new(&store, &hasher);
//! let report = engine
//!     .verify(&VerificationRequest::new(vec!["Tetris (World).gb".into()]))
//!     .await;
//!
//! println!("{}/{} verified", report.successful, report.total);
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Datfile codec, on-disk cache layout and the in-memory store
//! - [`core`]: Core data types for origins, systems and entries
//! - [`ingest`]: Networked and offline ingestion pipelines
//! - [`verify`]: Hashing provider and verification engine
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: JSON API for selection and verification

pub mod catalog;
pub mod cli;
pub mod core;
pub mod ingest;
pub mod utils;
pub mod verify;
pub mod web;

// Re-export commonly used types for convenience
pub use crate::catalog::store::{CatalogStore, Scope, SystemCatalog};
pub use crate::core::entry::CatalogEntry;
pub use crate::core::types::*;
pub use crate::ingest::{IngestConfig, IngestError, IngestReport};
pub use crate::verify::{
    FileHasher, HashProvider, VerificationEngine, VerificationOutcome, VerificationReport,
    VerificationRequest, VerifyConfig,
};
