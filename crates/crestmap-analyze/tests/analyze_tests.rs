use compact_str::CompactString;
use crestmap_analyze::{Aggregator, TOP_TERMS, top_example};
use crestmap_core::{Bucket, HitRecord, Tier};
use std::path::PathBuf;

fn record(term: &str, repo: &str, frequency: u64) -> HitRecord {
    HitRecord {
        term: CompactString::new(term),
        repo: CompactString::new(repo),
        file_path: PathBuf::from(format!("/repos/{repo}/notes.md")),
        extension: CompactString::new(".md"),
        bucket: Bucket::Unknown,
        frequency,
        context: format!("line mentioning {term}"),
    }
}

#[test]
fn test_word_map_round_trips_through_json() {
    let records = vec![record("alpha", "r1", 4), record("beta", "r2", 2)];
    let map = Aggregator::new(0.9, 0.6).aggregate(records);

    let json = serde_json::to_string(&map).unwrap();
    let back: crestmap_analyze::WordMap = serde_json::from_str(&json).unwrap();
    assert_eq!(back.records.len(), 2);
    assert_eq!(back.tiers.len(), 2);
    assert_eq!(back.tiers[0].tier, Tier::Crest);
}

#[test]
fn test_top_terms_capped() {
    let mut records = Vec::new();
    for i in 0..20 {
        records.push(record(&format!("term{i}"), "r", (i + 1) as u64));
    }
    let map = Aggregator::new(0.9, 0.6).aggregate(records);

    assert_eq!(map.tiers.len(), 20);
    assert_eq!(map.summaries.top_terms.len(), TOP_TERMS);
    assert_eq!(map.summaries.top_terms[0].term, "term19");
}

#[test]
fn test_tier_counts_cover_every_term() {
    let records = vec![
        record("a", "r", 100),
        record("b", "r", 95),
        record("c", "r", 70),
        record("d", "r", 5),
    ];
    let map = Aggregator::new(0.9, 0.6).aggregate(records);

    let counted: u64 = map.summaries.tier_counts.iter().map(|t| t.terms).sum();
    assert_eq!(counted, map.tiers.len() as u64);
}

#[test]
fn test_top_example_feeds_reporting() {
    let records = vec![record("a", "r1", 1), record("a", "r2", 3)];
    let map = Aggregator::new(0.9, 0.6).aggregate(records);

    let example = top_example(&map.records, "a").unwrap();
    assert_eq!(example.repo, "r2");
    assert!(example.context.contains("a"));
}
