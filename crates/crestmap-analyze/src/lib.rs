//! Term aggregation and tiering for crestmap.
//!
//! Reduces the hit records produced by a scan into per-term totals,
//! assigns each term a relative-prominence tier against the strongest
//! term, and derives the summary tables the report writers render.
//!
//! ```rust,ignore
//! use crestmap_analyze::Aggregator;
//!
//! let aggregator = Aggregator::from_config(&config);
//! let word_map = aggregator.aggregate(outcome.records);
//!
//! for tier in &word_map.tiers {
//!     println!("{} {} ({})", tier.term, tier.total, tier.tier);
//! }
//! ```

mod aggregate;

pub use aggregate::{
    Aggregator, BucketCount, RepoCount, Summaries, TOP_REPOS, TOP_TERMS, TierCount, WordMap,
    top_example,
};

// Re-export core types for convenience
pub use crestmap_core::{Bucket, HitRecord, TermTier, Tier};
