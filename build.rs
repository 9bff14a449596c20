use std::path::Path;

const SYSTEMS_PATH: &str = "catalogs/redump_systems.json";

fn main() {
    println!("cargo:rerun-if-changed={SYSTEMS_PATH}");
    println!("cargo:rerun-if-changed=build.rs");

    let contents = std::fs::read_to_string(Path::new(SYSTEMS_PATH))
        .unwrap_or_else(|e| panic!("Cannot read {SYSTEMS_PATH}: {e}"));
    let document: serde_json::Value = serde_json::from_str(&contents)
        .unwrap_or_else(|e| panic!("Invalid JSON in {SYSTEMS_PATH}: {e}"));

    let slugs = document
        .get("systems")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| panic!("{SYSTEMS_PATH} must hold a 'systems' array"));

    for (i, slug) in slugs.iter().enumerate() {
        let slug = slug.as_str().unwrap_or_default();
        assert!(!slug.is_empty(), "Empty or non-string slug at index {i} of {SYSTEMS_PATH}");
    }
}
