//! Discovery of the Redump system list.
//!
//! The download index links one datfile per system as `/datfile/<slug>/`.
//! When the index cannot be read the list falls back to the slugs already
//! cached on disk, then to the list compiled into the binary.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

const EMBEDDED_SYSTEMS: &str = include_str!("../../catalogs/redump_systems.json");

#[derive(Deserialize)]
struct SystemList {
    systems: Vec<String>,
}

fn datfile_link() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| {
        Regex::new(r#"href\s*=\s*["'](?:https?://(?:www\.)?redump\.org)?/datfile/([a-z0-9-]+)/["']"#)
            .unwrap_or_else(|e| unreachable!("datfile link pattern is valid: {e}"))
    })
}

/// Slugs linked from an index page, deduplicated, in page order
#[must_use]
pub fn scan_datfile_links(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    datfile_link()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|slug| seen.insert(slug.clone()))
        .collect()
}

/// The system list shipped with the binary
///
/// Validated by the build script, so a decode failure here means the file
/// was edited after the build; an empty list is returned in that case.
#[must_use]
pub fn embedded_systems() -> Vec<String> {
    match serde_json::from_str::<SystemList>(EMBEDDED_SYSTEMS) {
        Ok(list) => list.systems,
        Err(e) => {
            warn!("Embedded system list is unreadable: {e}");
            Vec::new()
        }
    }
}
