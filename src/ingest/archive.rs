//! Extraction of the datfile embedded in a downloaded archive.

use std::io::{Cursor, Read};

use thiserror::Error;

use crate::catalog::cache::RAW_EXT;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Not a readable zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive contains no .{RAW_EXT} document")]
    NoDatfile,

    #[error("Failed to read archived datfile: {0}")]
    Read(#[from] std::io::Error),
}

/// Return the bytes of the first `.dat` member of a zip archive
///
/// Redump answers unauthenticated requests for gated systems with an HTML
/// page instead of a zip, which surfaces here as `ArchiveError::Zip`.
///
/// # Errors
///
/// Returns `ArchiveError::Zip` if the bytes are not a zip archive,
/// `ArchiveError::NoDatfile` if no member ends in `.dat`, or
/// `ArchiveError::Read` if the member cannot be decompressed.
pub fn extract_datfile(archive_bytes: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes))?;

    let suffix = format!(".{RAW_EXT}");
    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        if member.name().to_lowercase().ends_with(&suffix) {
            let mut contents = Vec::new();
            member.read_to_end(&mut contents)?;
            return Ok(contents);
        }
    }

    Err(ArchiveError::NoDatfile)
}

#[cfg(test)]
pub(crate) fn build_zip(members: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in members {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
