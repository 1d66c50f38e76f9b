//! Hit records and tier assignment.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Content bucket derived from the whole-file hint patterns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Bucket {
    /// Only the planned-documentation hint matched.
    Planned,
    /// Only the code hint matched.
    Code,
    /// Both hints matched.
    Overlap,
    /// Neither hint matched.
    Unknown,
}

impl Bucket {
    /// Pure mapping from the two hint booleans to a bucket.
    pub fn from_hints(planned: bool, code: bool) -> Self {
        match (planned, code) {
            (true, true) => Self::Overlap,
            (true, false) => Self::Planned,
            (false, true) => Self::Code,
            (false, false) => Self::Unknown,
        }
    }
}

/// Relative-prominence band for a term, highest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
pub enum Tier {
    Crest,
    Slopes,
    Base,
}

impl Tier {
    /// Assign a tier from a normalized score and the two thresholds.
    ///
    /// Callers guarantee `0 < slopes < crest <= 1`; the bands therefore
    /// partition `[0, 1]` with no gaps or overlaps.
    pub fn from_score(score: f64, crest_threshold: f64, slopes_threshold: f64) -> Self {
        if score >= crest_threshold {
            Self::Crest
        } else if score >= slopes_threshold {
            Self::Slopes
        } else {
            Self::Base
        }
    }
}

/// One `(file, term)` pair with at least one match.
///
/// Records are append-only: the engine emits them once per file scan and
/// nothing updates or deletes them afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitRecord {
    /// The matched anchor term, in its configured (case-preserving) form.
    pub term: CompactString,
    /// Repository name heuristic for the file.
    pub repo: CompactString,
    /// Full path of the scanned file.
    pub file_path: PathBuf,
    /// Lowercased file extension with leading dot.
    pub extension: CompactString,
    /// Whole-file content bucket.
    pub bucket: Bucket,
    /// Number of non-overlapping matches; always >= 1.
    pub frequency: u64,
    /// First matched line, whitespace-collapsed and truncated.
    pub context: String,
}

/// Aggregated total and tier for one term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermTier {
    /// The term, in its first-encountered configured form.
    pub term: CompactString,
    /// Sum of frequencies across all hits for the term.
    pub total: u64,
    /// `total / max_total`, rounded to 3 decimals.
    pub score: f64,
    /// Band assigned from `score`; a pure function of it and the two
    /// thresholds.
    pub tier: Tier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_from_hints_covers_all_cases() {
        assert_eq!(Bucket::from_hints(true, true), Bucket::Overlap);
        assert_eq!(Bucket::from_hints(true, false), Bucket::Planned);
        assert_eq!(Bucket::from_hints(false, true), Bucket::Code);
        assert_eq!(Bucket::from_hints(false, false), Bucket::Unknown);
    }

    #[test]
    fn test_bucket_display() {
        assert_eq!(Bucket::Overlap.to_string(), "Overlap");
        assert_eq!(Bucket::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_tier_from_score_bands() {
        assert_eq!(Tier::from_score(1.0, 0.9, 0.6), Tier::Crest);
        assert_eq!(Tier::from_score(0.9, 0.9, 0.6), Tier::Crest);
        assert_eq!(Tier::from_score(0.89, 0.9, 0.6), Tier::Slopes);
        assert_eq!(Tier::from_score(0.6, 0.9, 0.6), Tier::Slopes);
        assert_eq!(Tier::from_score(0.1, 0.9, 0.6), Tier::Base);
        assert_eq!(Tier::from_score(0.0, 0.9, 0.6), Tier::Base);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Crest < Tier::Slopes);
        assert!(Tier::Slopes < Tier::Base);
    }
}
