//! Security Test Suite
//!
//! Validates the hardening around user-supplied file names, imported
//! datfiles, cache writes and API error responses.

use dump_verifier::catalog::cache::DatLayout;
use dump_verifier::ingest::no_intro::NoIntroIngestor;
use dump_verifier::ingest::FailureKind;
use dump_verifier::{CatalogEntry, CatalogStore, Origin, SystemId};

/// Test filename validation and sanitization
#[test]
fn test_filename_validation_security() {
    use dump_verifier::utils::validation::{validate_filename, ValidationError};

    // Test directory traversal prevention
    let traversal_attempts = vec![
        "../etc/passwd",
        "..\\windows\\system32",
        "test/../../secret.dat",
        "normal/../../../etc/passwd",
    ];

    for attempt in traversal_attempts {
        match validate_filename(attempt) {
            Err(ValidationError::InvalidFilename) => {}
            Ok(_) => panic!("Directory traversal attempt '{attempt}' should have been blocked"),
            Err(e) => panic!("Unexpected error for '{attempt}': {e:?}"),
        }
    }

    // Test null byte and control character injection prevention
    for attempt in ["test\0.dat", "normal.dat\0", "file\x1f.dat", "name\x0b.dat"] {
        assert!(
            validate_filename(attempt).is_err(),
            "Injection '{attempt:?}' should be blocked"
        );
    }

    // Test valid datfile names are accepted and properly sanitized
    let valid_tests = vec![
        (
            "Nintendo - Game Boy (20240101-000000).dat",
            "Nintendo - Game Boy (20240101-000000).dat",
        ),
        ("Sega - Mega Drive [BIOS].dat", "Sega - Mega Drive [BIOS].dat"),
        ("odd@#$%name.dat", "oddname.dat"),
    ];

    for (input, expected) in valid_tests {
        match validate_filename(input) {
            Ok(sanitized) => assert_eq!(sanitized, expected, "Sanitization failed for '{input}'"),
            Err(e) => panic!("Valid filename '{input}' should be accepted: {e:?}"),
        }
    }
}

/// Imports only accept .dat files and never write outside the origin directory
#[tokio::test]
async fn test_import_rejects_unsafe_files() {
    let data = tempfile::tempdir().unwrap();
    let downloads = tempfile::tempdir().unwrap();
    let layout = DatLayout::new(data.path());
    layout.ensure().await.unwrap();

    let script = downloads.path().join("payload.sh");
    std::fs::write(&script, b"#!/bin/sh\n").unwrap();
    let hidden = downloads.path().join(".hidden.dat");
    std::fs::write(&hidden, b"<datafile/>").unwrap();

    let mut store = CatalogStore::new();
    let report = NoIntroIngestor::new(&layout)
        .import(&[script, hidden], &mut store)
        .await
        .unwrap();

    assert_eq!(report.count(FailureKind::Import), 2);
    assert_eq!(report.loaded, 0);
    assert!(store.is_empty());

    let leftovers: Vec<_> = std::fs::read_dir(layout.origin_dir(Origin::NoIntro))
        .unwrap()
        .collect();
    assert!(leftovers.is_empty(), "Rejected files must not be copied");
}

/// Atomic cache writes must not leave temporary files behind
#[tokio::test]
async fn test_cache_write_leaves_no_temp_files() {
    let data = tempfile::tempdir().unwrap();
    let layout = DatLayout::new(data.path());
    layout.ensure().await.unwrap();

    let entries = vec![CatalogEntry::new(
        "da39a3ee5e6b4b0d3255bfef95601890afd80709",
        "Empty.iso",
        SystemId::new("redump/test"),
        0,
    )];
    for _ in 0..3 {
        layout
            .write_normalized(Origin::Redump, "test", &entries)
            .await
            .unwrap();
    }

    let names: Vec<String> = std::fs::read_dir(layout.origin_dir(Origin::Redump))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["test.json".to_string()]);
}

/// Test that error responses don't leak internal information
#[test]
fn test_error_sanitization() {
    use dump_verifier::web::server::create_safe_error_response;

    let error_response = create_safe_error_response("hash_failure", "File could not be read");

    assert_eq!(error_response.error, "File could not be read");
    assert_eq!(error_response.error_type, "hash_failure");
    assert!(error_response.details.is_none());
}

/// API limits are set to sane bounds
#[test]
fn test_api_limits() {
    use dump_verifier::web::server::{MAX_BODY_SIZE, MAX_VERIFY_FILES};

    assert!(MAX_VERIFY_FILES >= 1);
    assert!(MAX_BODY_SIZE <= 16 * 1024 * 1024);
}
