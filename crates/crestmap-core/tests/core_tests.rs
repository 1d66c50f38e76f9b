use std::fs;

use crestmap_core::{Bucket, ScanConfig, ScanError, Tier};
use tempfile::TempDir;

#[test]
fn test_load_config_from_yaml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("crestmap.yaml");
    fs::write(
        &path,
        r#"
include_roots:
  - /repos
extensions:
  - "*.md"
  - .rs
anchor_terms:
  - TODO
  - Fixme
  - todo
exclude_dir_pattern: "(node_modules|target)"
planned_hint_pattern: "(?m)^#\\s+Plan"
code_hint_pattern: "fn\\s+\\w+"
crest_threshold: 0.85
slopes_threshold: 0.5
max_file_size: 1048576
"#,
    )
    .unwrap();

    let cfg = ScanConfig::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.include_roots.len(), 1);
    assert_eq!(cfg.extensions, vec![".md", ".rs"]);
    // case-insensitive dedup keeps the first form
    assert_eq!(cfg.anchor_terms, vec!["TODO", "Fixme"]);
    assert_eq!(cfg.crest_threshold, 0.85);
    assert_eq!(cfg.max_file_size, Some(1_048_576));
}

#[test]
fn test_load_config_missing_file() {
    let temp = TempDir::new().unwrap();
    let result = ScanConfig::from_yaml_file(temp.path().join("absent.yaml"));
    assert!(matches!(result, Err(ScanError::ConfigRead { .. })));
}

#[test]
fn test_load_config_rejects_empty_terms() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("crestmap.yaml");
    fs::write(
        &path,
        r#"
include_roots: ["/repos"]
extensions: [".md"]
anchor_terms: ["  ", ""]
"#,
    )
    .unwrap();

    let result = ScanConfig::from_yaml_file(&path);
    assert!(matches!(result, Err(ScanError::Config { .. })));
}

#[test]
fn test_load_config_rejects_threshold_ordering() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("crestmap.yaml");
    fs::write(
        &path,
        r#"
include_roots: ["/repos"]
extensions: [".md"]
anchor_terms: ["TODO"]
crest_threshold: 0.4
slopes_threshold: 0.6
"#,
    )
    .unwrap();

    let result = ScanConfig::from_yaml_file(&path);
    assert!(matches!(result, Err(ScanError::Config { .. })));
}

#[test]
fn test_bucket_and_tier_round_trip_serde() {
    let bucket: Bucket = serde_json::from_str("\"Overlap\"").unwrap();
    assert_eq!(bucket, Bucket::Overlap);
    let tier: Tier = serde_json::from_str("\"Slopes\"").unwrap();
    assert_eq!(tier, Tier::Slopes);
}
