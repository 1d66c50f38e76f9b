//! Aggregation of hit records into tiers and summaries.

use compact_str::CompactString;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crestmap_core::{Bucket, HitRecord, ScanConfig, TermTier, Tier};

/// Number of repos listed in the repo summary.
pub const TOP_REPOS: usize = 10;
/// Number of terms listed in the top-terms summary.
pub const TOP_TERMS: usize = 15;

/// Full aggregation result: the raw records plus the derived views.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordMap {
    /// All hit records, in no particular cross-file order.
    pub records: Vec<HitRecord>,
    /// One entry per distinct term with at least one hit, ordered by total
    /// descending (ties keep first-encountered order).
    pub tiers: Vec<TermTier>,
    /// Presentation summaries derived from records and tiers.
    pub summaries: Summaries,
}

impl WordMap {
    /// Whether the scan produced no hits at all. Callers should render this
    /// as "nothing found", never as an error.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Hit count for one bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: Bucket,
    pub hits: u64,
}

/// Term count for one tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierCount {
    pub tier: Tier,
    pub terms: u64,
}

/// Hit count for one repo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoCount {
    pub repo: CompactString,
    pub hits: u64,
}

/// Summary tables for reporting. Ordering within each table is for
/// presentation only; equal counts keep first-encountered order, which is
/// implementation-defined and not a contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summaries {
    /// Hit count per bucket, descending.
    pub buckets: Vec<BucketCount>,
    /// Term count per tier, descending.
    pub tier_counts: Vec<TierCount>,
    /// Repos with the most hits, descending.
    pub top_repos: Vec<RepoCount>,
    /// Terms with the highest totals, descending.
    pub top_terms: Vec<TermTier>,
}

/// Reduces hit records into tiered totals and summaries.
///
/// Runs single-threaded after all scanning has joined; it operates on a
/// fully materialized, immutable record set.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    crest_threshold: f64,
    slopes_threshold: f64,
}

impl Aggregator {
    /// Create an aggregator with explicit thresholds.
    pub fn new(crest_threshold: f64, slopes_threshold: f64) -> Self {
        Self {
            crest_threshold,
            slopes_threshold,
        }
    }

    /// Create an aggregator from a validated config.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.crest_threshold, config.slopes_threshold)
    }

    /// Aggregate records into a word map. Zero records yield an empty map,
    /// never an error.
    pub fn aggregate(&self, records: Vec<HitRecord>) -> WordMap {
        if records.is_empty() {
            return WordMap::default();
        }
        let tiers = self.tier_terms(&records);
        let summaries = build_summaries(&records, &tiers);
        WordMap {
            records,
            tiers,
            summaries,
        }
    }

    /// Group records by term (case-insensitive, first-encountered form
    /// wins), sum frequencies, and assign tiers against the maximum total.
    fn tier_terms(&self, records: &[HitRecord]) -> Vec<TermTier> {
        let mut totals: IndexMap<String, (CompactString, u64)> = IndexMap::new();
        for record in records {
            let entry = totals
                .entry(record.term.to_lowercase().to_string())
                .or_insert_with(|| (record.term.clone(), 0));
            entry.1 += record.frequency;
        }

        let max_total = totals.values().map(|(_, total)| *total).max().unwrap_or(0);
        if max_total == 0 {
            return Vec::new();
        }

        let mut tiers: Vec<TermTier> = totals
            .into_values()
            .map(|(term, total)| {
                let score = round3(total as f64 / max_total as f64);
                TermTier {
                    term,
                    total,
                    score,
                    tier: Tier::from_score(score, self.crest_threshold, self.slopes_threshold),
                }
            })
            .collect();
        // stable sort: equal totals keep first-encountered order
        tiers.sort_by(|a, b| b.total.cmp(&a.total));
        tiers
    }
}

/// The representative hit for a term: highest frequency, ties broken by
/// first-encountered order.
pub fn top_example<'a>(records: &'a [HitRecord], term: &str) -> Option<&'a HitRecord> {
    let wanted = term.to_lowercase();
    records
        .iter()
        .filter(|record| record.term.to_lowercase() == wanted)
        .reduce(|best, record| {
            if record.frequency > best.frequency {
                record
            } else {
                best
            }
        })
}

fn build_summaries(records: &[HitRecord], tiers: &[TermTier]) -> Summaries {
    let mut bucket_counts: IndexMap<Bucket, u64> = IndexMap::new();
    for record in records {
        *bucket_counts.entry(record.bucket).or_default() += 1;
    }
    let buckets = bucket_counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .map(|(bucket, hits)| BucketCount { bucket, hits })
        .collect();

    let mut per_tier: IndexMap<Tier, u64> = IndexMap::new();
    for tier in tiers {
        *per_tier.entry(tier.tier).or_default() += 1;
    }
    let tier_counts = per_tier
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .map(|(tier, terms)| TierCount { tier, terms })
        .collect();

    let mut repo_counts: IndexMap<CompactString, u64> = IndexMap::new();
    for record in records {
        *repo_counts.entry(record.repo.clone()).or_default() += 1;
    }
    let top_repos = repo_counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .take(TOP_REPOS)
        .map(|(repo, hits)| RepoCount { repo, hits })
        .collect();

    let top_terms = tiers.iter().take(TOP_TERMS).cloned().collect();

    Summaries {
        buckets,
        tier_counts,
        top_repos,
        top_terms,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(term: &str, repo: &str, bucket: Bucket, frequency: u64) -> HitRecord {
        HitRecord {
            term: CompactString::new(term),
            repo: CompactString::new(repo),
            file_path: PathBuf::from(format!("/repos/{repo}/file.md")),
            extension: CompactString::new(".md"),
            bucket,
            frequency,
            context: format!("{term} in context"),
        }
    }

    #[test]
    fn test_empty_records_yield_empty_map() {
        let map = Aggregator::new(0.9, 0.6).aggregate(Vec::new());
        assert!(map.is_empty());
        assert!(map.tiers.is_empty());
        assert!(map.summaries.buckets.is_empty());
        assert!(map.summaries.top_repos.is_empty());
    }

    #[test]
    fn test_alpha_beta_scenario() {
        let records = vec![
            record("Alpha", "r1", Bucket::Code, 10),
            record("Beta", "r2", Bucket::Planned, 1),
        ];
        let map = Aggregator::new(0.9, 0.5).aggregate(records);

        assert_eq!(map.tiers.len(), 2);
        let alpha = &map.tiers[0];
        assert_eq!(alpha.term, "Alpha");
        assert_eq!(alpha.score, 1.0);
        assert_eq!(alpha.tier, Tier::Crest);
        let beta = &map.tiers[1];
        assert_eq!(beta.score, 0.1);
        assert_eq!(beta.tier, Tier::Base);
    }

    #[test]
    fn test_totals_partition_frequencies() {
        let records = vec![
            record("a", "r1", Bucket::Code, 3),
            record("A", "r2", Bucket::Code, 4),
            record("b", "r1", Bucket::Unknown, 5),
        ];
        let map = Aggregator::new(0.9, 0.6).aggregate(records);

        let tier_sum: u64 = map.tiers.iter().map(|t| t.total).sum();
        let hit_sum: u64 = map.records.iter().map(|r| r.frequency).sum();
        assert_eq!(tier_sum, hit_sum);
        // case-insensitive grouping keeps the first-encountered form
        assert_eq!(map.tiers.iter().find(|t| t.total == 7).unwrap().term, "a");
    }

    #[test]
    fn test_max_term_is_always_crest() {
        let records = vec![
            record("x", "r", Bucket::Code, 42),
            record("y", "r", Bucket::Code, 41),
        ];
        let map = Aggregator::new(1.0, 0.5).aggregate(records);
        assert_eq!(map.tiers[0].score, 1.0);
        assert_eq!(map.tiers[0].tier, Tier::Crest);
    }

    #[test]
    fn test_tier_assignment_is_monotonic() {
        let records = vec![
            record("high", "r", Bucket::Code, 100),
            record("mid", "r", Bucket::Code, 70),
            record("low", "r", Bucket::Code, 10),
        ];
        let map = Aggregator::new(0.9, 0.6).aggregate(records);

        for pair in map.tiers.windows(2) {
            assert!(pair[0].total >= pair[1].total);
            assert!(pair[0].tier <= pair[1].tier);
        }
    }

    #[test]
    fn test_score_rounding() {
        // 1/3 rounds to 0.333
        let records = vec![
            record("big", "r", Bucket::Code, 3),
            record("small", "r", Bucket::Code, 1),
        ];
        let map = Aggregator::new(0.9, 0.6).aggregate(records);
        assert_eq!(map.tiers[1].score, 0.333);
    }

    #[test]
    fn test_bucket_distribution_descending() {
        let records = vec![
            record("t", "r1", Bucket::Code, 1),
            record("t", "r2", Bucket::Code, 1),
            record("t", "r3", Bucket::Planned, 1),
        ];
        let map = Aggregator::new(0.9, 0.6).aggregate(records);

        let buckets = &map.summaries.buckets;
        assert_eq!(buckets[0].bucket, Bucket::Code);
        assert_eq!(buckets[0].hits, 2);
        assert_eq!(buckets[1].bucket, Bucket::Planned);
    }

    #[test]
    fn test_top_repos_capped_and_descending() {
        let mut records = Vec::new();
        for i in 0..12 {
            for _ in 0..=i {
                records.push(record("t", &format!("repo{i}"), Bucket::Code, 1));
            }
        }
        let map = Aggregator::new(0.9, 0.6).aggregate(records);

        let repos = &map.summaries.top_repos;
        assert_eq!(repos.len(), TOP_REPOS);
        assert_eq!(repos[0].repo, "repo11");
        for pair in repos.windows(2) {
            assert!(pair[0].hits >= pair[1].hits);
        }
    }

    #[test]
    fn test_top_example_prefers_frequency_then_first_seen() {
        let records = vec![
            record("t", "r1", Bucket::Code, 2),
            record("t", "r2", Bucket::Code, 5),
            record("t", "r3", Bucket::Code, 5),
            record("other", "r4", Bucket::Code, 9),
        ];
        let best = top_example(&records, "T").unwrap();
        assert_eq!(best.repo, "r2");
        assert!(top_example(&records, "absent").is_none());
    }
}
