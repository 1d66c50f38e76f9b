//! Whole-file bucket classification.

use regex::{Regex, RegexBuilder};

use crestmap_core::{Bucket, ScanError};

/// Applies the planned/code hint patterns to whole-file text.
///
/// Hint patterns are file-level signals, independent of which anchor terms
/// are present, so classification runs once per file. An absent pattern
/// matches nothing; with both absent every file is [`Bucket::Unknown`].
#[derive(Debug, Default)]
pub struct BucketClassifier {
    planned: Option<Regex>,
    code: Option<Regex>,
}

impl BucketClassifier {
    /// Compile the hint patterns. Unlike the path exclusion rules these are
    /// part of the validated configuration, so a malformed pattern is a
    /// configuration error rather than a local degradation.
    pub fn new(
        planned_pattern: Option<&str>,
        code_pattern: Option<&str>,
    ) -> Result<Self, ScanError> {
        Ok(Self {
            planned: compile_hint(planned_pattern)?,
            code: compile_hint(code_pattern)?,
        })
    }

    /// Classify whole-file text into one of the four buckets.
    pub fn classify(&self, text: &str) -> Bucket {
        let planned = self.planned.as_ref().is_some_and(|re| re.is_match(text));
        let code = self.code.as_ref().is_some_and(|re| re.is_match(text));
        Bucket::from_hints(planned, code)
    }
}

fn compile_hint(pattern: Option<&str>) -> Result<Option<Regex>, ScanError> {
    let Some(pattern) = pattern.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|source| ScanError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}
