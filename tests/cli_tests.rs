//! Command-line smoke tests run against a scratch data directory.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

fn cmd(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dump-verifier").unwrap();
    cmd.env_remove("DUMP_VERIFIER_COOKIE")
        .arg("--offline")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn seed_catalog(data_dir: &Path) {
    let dir = data_dir.join("dat").join("redump");
    std::fs::create_dir_all(&dir).unwrap();
    let catalog = format!(
        r#"[{{"sha1":"{EMPTY_SHA1}","name":"Empty.iso","extension":"iso","system":"redump/test","size":0}}]"#
    );
    std::fs::write(dir.join("test.json"), catalog).unwrap();
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("dump-verifier")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_systems_on_empty_cache() {
    let data = tempfile::tempdir().unwrap();
    cmd(data.path())
        .arg("systems")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded systems (0)"));

    assert!(data.path().join("dat/redump").is_dir());
    assert!(data.path().join("dat/no-intro").is_dir());
}

#[test]
fn test_systems_tsv() {
    let data = tempfile::tempdir().unwrap();
    seed_catalog(data.path());
    cmd(data.path())
        .args(["--format", "tsv", "systems"])
        .assert()
        .success()
        .stdout(predicate::str::contains("redump/test\tredump/test\t1"));
}

#[test]
fn test_verify_json() {
    let data = tempfile::tempdir().unwrap();
    seed_catalog(data.path());
    let blank = data.path().join("blank.iso");
    std::fs::write(&blank, b"").unwrap();

    cmd(data.path())
        .args(["--format", "json", "verify"])
        .arg(&blank)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"successful\": 1"))
        .stdout(predicate::str::contains("Empty.iso"));
}

#[test]
fn test_verify_text_reports_missing_file() {
    let data = tempfile::tempdir().unwrap();
    seed_catalog(data.path());

    cmd(data.path())
        .args(["verify", "--no-progress"])
        .arg(data.path().join("missing.iso"))
        .assert()
        .success()
        .stdout(predicate::str::contains("[ERROR]"))
        .stdout(predicate::str::contains("Verified 0/1 files"));
}

#[test]
fn test_verify_with_unloaded_system_reports_no_match() {
    let data = tempfile::tempdir().unwrap();
    seed_catalog(data.path());
    let blank = data.path().join("blank.iso");
    std::fs::write(&blank, b"").unwrap();

    cmd(data.path())
        .args(["verify", "--no-progress", "--system", "redump/none"])
        .arg(&blank)
        .assert()
        .success()
        .stdout(predicate::str::contains("[NO MATCH]"))
        .stdout(predicate::str::contains("Verified 0/1 files"))
        .stderr(predicate::str::contains("redump/none is not loaded"));
}

#[test]
fn test_game_requires_system() {
    let data = tempfile::tempdir().unwrap();
    cmd(data.path())
        .args(["verify", "a.bin", "--game", "Game (USA).bin"])
        .assert()
        .failure();
}

#[test]
fn test_games_unknown_system() {
    let data = tempfile::tempdir().unwrap();
    cmd(data.path())
        .args(["games", "--system", "redump/none"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown system"));
}

#[test]
fn test_purge() {
    let data = tempfile::tempdir().unwrap();
    seed_catalog(data.path());

    cmd(data.path())
        .args(["purge", "redump"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 Redump files"));
    assert!(!data.path().join("dat/redump/test.json").exists());

    cmd(data.path()).args(["purge", "bogus"]).assert().failure();
}

#[test]
fn test_update_refuses_offline() {
    let data = tempfile::tempdir().unwrap();
    cmd(data.path()).arg("update").assert().failure();
}

#[test]
fn test_import_datfile() {
    let data = tempfile::tempdir().unwrap();
    let dat = data.path().join("Nintendo - Game Boy (20240101).dat");
    std::fs::write(
        &dat,
        format!(
            r#"<datafile><header><name>Nintendo - Game Boy</name></header>
            <game name="Blank"><rom name="Blank (World).gb" size="0" sha1="{EMPTY_SHA1}"/></game></datafile>"#
        ),
    )
    .unwrap();

    cmd(data.path())
        .arg("import")
        .arg(&dat)
        .assert()
        .success()
        .stdout(predicate::str::contains("No-Intro: loaded 1/1 catalogs"));

    cmd(data.path())
        .args(["--format", "tsv", "games", "--system", "no-intro/nintendo-game-boy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Blank (World).gb\tgb\t0"));
}
