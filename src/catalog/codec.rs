//! Conversion between raw XML datfiles and the normalized catalog form.
//!
//! Raw datfiles (Logiqx XML as published by Redump and No-Intro) look like:
//!
//! ```text
//! <datafile>
//!   <header><name>Sony - PlayStation</name>...</header>
//!   <game name="...">
//!     <rom name="Game (USA).cue" size="1234" crc="..." md5="..." sha1="..."/>
//!   </game>
//! </datafile>
//! ```
//!
//! The normalized form is a flat JSON array of [`CatalogEntry`] records.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::entry::CatalogEntry;
use crate::core::types::{Origin, SystemId};
use crate::utils::validation::{normalize_sha1, slugify, MAX_ENTRIES};

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed XML at position {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("Too many rom entries: exceeds maximum of {MAX_ENTRIES}")]
    TooManyEntries,

    #[error("Failed to (de)serialize normalized catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a raw datfile into normalized entries.
///
/// Never fails: a document that cannot be parsed yields an empty list, which
/// callers treat as an ingestion failure for that source.
#[must_use]
pub fn parse(raw_document: &[u8], origin: Origin) -> Vec<CatalogEntry> {
    match try_parse(raw_document, origin) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Discarding unparseable {origin} datfile: {e}");
            Vec::new()
        }
    }
}

/// Parse a raw datfile, reporting why it could not be read.
///
/// # Errors
///
/// Returns `CodecError::Xml` when the document is not well-formed XML or ends
/// before its root element is closed, and `CodecError::TooManyEntries` when it
/// exceeds [`MAX_ENTRIES`] roms.
pub fn try_parse(raw_document: &[u8], origin: Origin) -> Result<Vec<CatalogEntry>, CodecError> {
    let mut reader = Reader::from_reader(raw_document);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut depth: usize = 0;
    let mut system_name: Option<String> = None;
    let mut in_name = false;
    // Roms are collected first since the header name normally precedes them
    // but is not required to.
    let mut roms: Vec<RawRom> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.name().as_ref() {
                    b"name" if system_name.is_none() => in_name = true,
                    b"rom" => push_rom(&mut roms, &e)?,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"rom" {
                    push_rom(&mut roms, &e)?;
                }
            }
            Ok(Event::Text(e)) => {
                if in_name {
                    let text = e
                        .unescape()
                        .map_or_else(|_| String::from_utf8_lossy(&e).to_string(), |t| t.to_string());
                    system_name = Some(text);
                }
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                if e.name().as_ref() == b"name" && in_name {
                    in_name = false;
                    system_name.get_or_insert_with(String::new);
                }
            }
            Ok(Event::Eof) if depth > 0 => {
                return Err(CodecError::Xml {
                    position: reader.buffer_position(),
                    message: format!("document ends with {depth} unclosed elements"),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CodecError::Xml {
                    position: reader.error_position(),
                    message: e.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    let system_name = system_name.unwrap_or_default();
    let system_id = SystemId::compose(origin, &slugify(&system_name));
    debug!(
        "Parsed {} roms for {system_id} (\"{system_name}\")",
        roms.len()
    );

    Ok(roms
        .into_iter()
        .map(|rom| CatalogEntry::new(rom.sha1, rom.name, system_id.clone(), rom.size))
        .collect())
}

/// Serialize entries to the normalized cache format.
///
/// # Errors
///
/// Returns `CodecError::Json` if serialization fails.
pub fn serialize(entries: &[CatalogEntry]) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(entries)?)
}

/// Read entries back from the normalized cache format.
///
/// # Errors
///
/// Returns `CodecError::Json` if the bytes are not a valid entry array.
pub fn deserialize(bytes: &[u8]) -> Result<Vec<CatalogEntry>, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

struct RawRom {
    sha1: String,
    name: String,
    size: u64,
}

fn push_rom(roms: &mut Vec<RawRom>, e: &BytesStart<'_>) -> Result<(), CodecError> {
    if roms.len() >= MAX_ENTRIES {
        return Err(CodecError::TooManyEntries);
    }
    roms.push(parse_rom_attributes(e));
    Ok(())
}

fn parse_rom_attributes(e: &BytesStart<'_>) -> RawRom {
    let mut rom = RawRom {
        sha1: String::new(),
        name: String::new(),
        size: 0,
    };

    for attr in e.attributes().flatten() {
        let value = attr
            .unescape_value()
            .map_or_else(|_| String::from_utf8_lossy(&attr.value).to_string(), |v| v.to_string());

        match attr.key.as_ref() {
            b"sha1" => {
                rom.sha1 = normalize_sha1(&value).unwrap_or_else(|| {
                    debug!("Ignoring malformed sha1 \"{value}\"");
                    String::new()
                });
            }
            b"name" => rom.name = value,
            b"size" => rom.size = value.trim().parse().unwrap_or(0),
            _ => {}
        }
    }

    rom
}

#[cfg(test)]
mod tests {
    use super::*;

    const PSX_DAT: &str = r#"<?xml version="1.0"?>
<!DOCTYPE datafile PUBLIC "-//Logiqx//DTD ROM Management Datafile//EN" "http://www.logiqx.com/dtds/datafile.dtd">
<datafile>
  <header>
    <name>Sony - PlayStation</name>
    <description>Sony - PlayStation - Discs (10869) (2024-01-01 00-00-00)</description>
  </header>
  <game name="Crash Bandicoot (USA)">
    <category>Games</category>
    <description>Crash Bandicoot (USA)</description>
    <rom name="Crash Bandicoot (USA).cue" size="91" crc="00000000" md5="x" sha1="AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"/>
    <rom name="Crash Bandicoot (USA).bin" size="533397504" sha1="bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"/>
  </game>
  <game name="Tom &amp; Jerry (Europe)">
    <rom name="Tom &amp; Jerry (Europe).bin" size="oops"/>
    <rom name="NoExtension" size="12" sha1="cccccccccccccccccccccccccccccccccccccccc"/>
  </game>
</datafile>"#;

    #[test]
    fn test_parse_counts_and_fields() {
        let entries = parse(PSX_DAT.as_bytes(), Origin::Redump);
        assert_eq!(entries.len(), 4);

        let cue = &entries[0];
        assert_eq!(cue.name, "Crash Bandicoot (USA).cue");
        assert_eq!(cue.extension, "cue");
        assert_eq!(cue.system_id.as_str(), "redump/sony-playstation");
        assert_eq!(cue.size_bytes, 91);
        assert_eq!(cue.content_hash, "a".repeat(40));

        assert_eq!(entries[1].size_bytes, 533_397_504);
        assert_eq!(entries[1].extension, "bin");
    }

    #[test]
    fn test_parse_defaults_for_missing_attributes() {
        let entries = parse(PSX_DAT.as_bytes(), Origin::Redump);

        let tom = &entries[2];
        assert_eq!(tom.name, "Tom & Jerry (Europe).bin");
        assert_eq!(tom.size_bytes, 0, "malformed size defaults to 0");
        assert_eq!(tom.content_hash, "", "missing sha1 yields empty string");

        assert_eq!(entries[3].extension, "");
    }

    #[test]
    fn test_parse_origin_prefix() {
        let entries = parse(PSX_DAT.as_bytes(), Origin::NoIntro);
        assert!(entries
            .iter()
            .all(|e| e.system_id.as_str() == "no-intro/sony-playstation"));
    }

    #[test]
    fn test_parse_malformed_is_empty() {
        let broken = b"<datafile><header><name>X</name></header><game><rom name=\"a.bin\"/></wrong></datafile>";
        assert!(parse(broken, Origin::Redump).is_empty());
        assert!(try_parse(broken, Origin::Redump).is_err());
    }

    #[test]
    fn test_parse_truncated_document_is_rejected() {
        let cut = PSX_DAT.find("<rom name=\"Crash Bandicoot (USA).bin\"").unwrap();
        let truncated = &PSX_DAT.as_bytes()[..cut];

        assert!(matches!(
            try_parse(truncated, Origin::Redump),
            Err(CodecError::Xml { .. })
        ));
        assert!(parse(truncated, Origin::NoIntro).is_empty());
    }

    #[test]
    fn test_parse_discards_malformed_sha1() {
        let doc = br#"<datafile><header><name>X</name></header>
            <game name="a"><rom name="a.bin" size="1" sha1="not-a-hash"/></game>
            <game name="b"><rom name="b.bin" size="1" sha1="ABCDEF0123ABCDEF0123ABCDEF0123ABCDEF0123"/></game>
            <game name="c"><rom name="c.bin" size="1" sha1="abc"/></game>
        </datafile>"#;
        let entries = parse(doc, Origin::Redump);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].content_hash, "");
        assert_eq!(entries[1].content_hash, "abcdef0123abcdef0123abcdef0123abcdef0123");
        assert_eq!(entries[2].content_hash, "");
        assert!(!entries[0].has_hash());
    }

    #[test]
    fn test_parse_without_roms() {
        let doc = b"<datafile><header><name>Empty</name></header></datafile>";
        assert!(parse(doc, Origin::NoIntro).is_empty());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let entries = parse(PSX_DAT.as_bytes(), Origin::Redump);
        let bytes = serialize(&entries).unwrap();
        assert_eq!(deserialize(&bytes).unwrap(), entries);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(deserialize(b"{\"not\": \"an array\"}").is_err());
    }
}
