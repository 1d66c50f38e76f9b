//! Scan configuration: shape, loading, normalization, validation.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use indexmap::IndexMap;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Configuration for a corpus scan.
///
/// Loaded once per run and never mutated afterwards. The loader performs
/// normalization and validation; the scan core trusts a validated config
/// beyond defensive defaults.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Directory roots to scan. Nonexistent roots are skipped without error.
    pub include_roots: Vec<PathBuf>,

    /// File-name suffixes to include, normalized to lowercase with a
    /// leading dot (accepts "md", ".md" or "*.md" on input).
    pub extensions: Vec<String>,

    /// Regex matched against full paths; matching directories are pruned
    /// before descent.
    #[builder(default)]
    #[serde(default)]
    pub exclude_dir_pattern: Option<String>,

    /// Regex matched against full paths; matching files are skipped.
    #[builder(default)]
    #[serde(default)]
    pub exclude_file_pattern: Option<String>,

    /// Inline glob-style ignore rules, one per entry. `!`-prefixed rules
    /// negate; the last matching rule for a path decides.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Extra files containing ignore rules, one rule per line.
    #[builder(default)]
    #[serde(default)]
    pub ignore_files: Vec<PathBuf>,

    /// Case-insensitive literal terms to count across the corpus.
    /// Blank entries are dropped; case-insensitive duplicates collapse to
    /// the first form.
    pub anchor_terms: Vec<String>,

    /// Whole-file hint regex marking planned documentation.
    #[builder(default)]
    #[serde(default)]
    pub planned_hint_pattern: Option<String>,

    /// Whole-file hint regex marking code.
    #[builder(default)]
    #[serde(default)]
    pub code_hint_pattern: Option<String>,

    /// Score at or above which a term lands in the Crest tier.
    #[builder(default = "0.90")]
    #[serde(default = "default_crest_threshold")]
    pub crest_threshold: f64,

    /// Score at or above which a term lands in the Slopes tier.
    #[builder(default = "0.60")]
    #[serde(default = "default_slopes_threshold")]
    pub slopes_threshold: f64,

    /// Files larger than this many bytes are skipped without error.
    #[builder(default)]
    #[serde(default)]
    pub max_file_size: Option<u64>,

    /// Worker threads for scanning (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Report output directory. Files under it are never scanned, so a
    /// report directory nested inside an include root is safe.
    #[builder(default)]
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_crest_threshold() -> f64 {
    0.90
}

fn default_slopes_threshold() -> f64 {
    0.60
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let (Some(crest), Some(slopes)) = (self.crest_threshold, self.slopes_threshold) {
            threshold_check(crest, slopes).map_err(|e| e.to_string())?;
        }
        if let Some(ref roots) = self.include_roots {
            if roots.is_empty() {
                return Err("include_roots cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Load a config from a YAML file, normalize it and validate it.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScanError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: Self = serde_yaml::from_str(&text).map_err(|source| ScanError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = raw.normalized();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply defensive normalization: extension canonicalization, blank-term
    /// dropping with case-insensitive dedup, empty-pattern collapse, and
    /// `${VAR}` environment expansion in include roots.
    pub fn normalized(mut self) -> Self {
        self.include_roots = self
            .include_roots
            .iter()
            .map(|p| PathBuf::from(expand_env(&p.to_string_lossy())))
            .filter(|p| !p.as_os_str().is_empty())
            .collect();

        self.extensions = self
            .extensions
            .iter()
            .filter_map(|e| normalize_extension(e))
            .collect();

        self.anchor_terms = dedup_terms(&self.anchor_terms);

        self.exclude_dir_pattern = collapse_empty(self.exclude_dir_pattern);
        self.exclude_file_pattern = collapse_empty(self.exclude_file_pattern);
        self.planned_hint_pattern = collapse_empty(self.planned_hint_pattern);
        self.code_hint_pattern = collapse_empty(self.code_hint_pattern);

        self
    }

    /// Validate a normalized config. Called by the loader; scanning never
    /// starts on a config that fails here.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.include_roots.is_empty() {
            return Err(ScanError::config("include_roots is empty"));
        }
        if self.extensions.is_empty() {
            return Err(ScanError::config("extensions is empty"));
        }
        if self.anchor_terms.is_empty() {
            return Err(ScanError::config("anchor_terms is empty"));
        }
        threshold_check(self.crest_threshold, self.slopes_threshold)?;

        // Hint patterns are part of the validated config; unlike the path
        // exclusion rules they fail the run when they do not compile.
        for pattern in [&self.planned_hint_pattern, &self.code_hint_pattern]
            .into_iter()
            .flatten()
        {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ScanError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

fn threshold_check(crest: f64, slopes: f64) -> Result<(), ScanError> {
    if !(crest > 0.0 && crest <= 1.0) {
        return Err(ScanError::config(format!(
            "crest_threshold must be in (0, 1]: {crest}"
        )));
    }
    if !(slopes > 0.0 && slopes < crest) {
        return Err(ScanError::config(format!(
            "slopes_threshold must be in (0, crest_threshold): {slopes}"
        )));
    }
    Ok(())
}

/// Normalize an extension spec like "md", ".MD" or "*.md" to ".md".
fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('*');
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with('.') {
        Some(lower)
    } else {
        Some(format!(".{lower}"))
    }
}

/// Drop blank terms and collapse case-insensitive duplicates, keeping the
/// first-encountered form and order.
fn dedup_terms(terms: &[String]) -> Vec<String> {
    let mut seen: IndexMap<String, String> = IndexMap::new();
    for term in terms {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        seen.entry(term.to_lowercase())
            .or_insert_with(|| term.to_string());
    }
    seen.into_values().collect()
}

fn collapse_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Expand `${VAR}` occurrences from the process environment. Unknown
/// variables are left as-is.
fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find('}') {
            Some(end) => {
                let name = &rest[start + 2..start + 2 + end];
                match std::env::var(name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => out.push_str(&rest[start..start + 3 + end]),
                }
                rest = &rest[start + 3 + end..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> ScanConfigBuilder {
        let mut b = ScanConfig::builder();
        b.include_roots(vec![PathBuf::from("/repo")])
            .extensions(vec![".md".to_string()])
            .anchor_terms(vec!["TODO".to_string()]);
        b
    }

    #[test]
    fn test_builder_defaults() {
        let cfg = base_builder().build().unwrap();
        assert_eq!(cfg.crest_threshold, 0.90);
        assert_eq!(cfg.slopes_threshold, 0.60);
        assert_eq!(cfg.threads, 0);
        assert!(cfg.max_file_size.is_none());
    }

    #[test]
    fn test_builder_rejects_inverted_thresholds() {
        let result = base_builder()
            .crest_threshold(0.5)
            .slopes_threshold(0.8)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_extension_forms() {
        assert_eq!(normalize_extension("md"), Some(".md".to_string()));
        assert_eq!(normalize_extension(".MD"), Some(".md".to_string()));
        assert_eq!(normalize_extension("*.Rs"), Some(".rs".to_string()));
        assert_eq!(normalize_extension("  "), None);
        assert_eq!(normalize_extension("*"), None);
    }

    #[test]
    fn test_dedup_terms_keeps_first_form_and_order() {
        let terms = vec![
            "Alpha".to_string(),
            "beta".to_string(),
            "ALPHA".to_string(),
            " ".to_string(),
            "Gamma".to_string(),
        ];
        assert_eq!(dedup_terms(&terms), vec!["Alpha", "beta", "Gamma"]);
    }

    #[test]
    fn test_normalized_collapses_empty_patterns() {
        let cfg = ScanConfig {
            include_roots: vec![PathBuf::from("/repo")],
            extensions: vec!["md".to_string()],
            exclude_dir_pattern: Some("  ".to_string()),
            exclude_file_pattern: Some(r"\.lock$".to_string()),
            ignore_patterns: Vec::new(),
            ignore_files: Vec::new(),
            anchor_terms: vec!["TODO".to_string()],
            planned_hint_pattern: Some(String::new()),
            code_hint_pattern: None,
            crest_threshold: 0.9,
            slopes_threshold: 0.6,
            max_file_size: None,
            threads: 0,
            output_dir: None,
        }
        .normalized();

        assert!(cfg.exclude_dir_pattern.is_none());
        assert_eq!(cfg.exclude_file_pattern.as_deref(), Some(r"\.lock$"));
        assert!(cfg.planned_hint_pattern.is_none());
        assert_eq!(cfg.extensions, vec![".md"]);
    }

    #[test]
    fn test_validate_rejects_bad_hint_regex() {
        let mut cfg = base_builder().build().unwrap();
        cfg.planned_hint_pattern = Some("(unclosed".to_string());
        assert!(matches!(
            cfg.validate(),
            Err(ScanError::Pattern { .. })
        ));
    }

    #[test]
    fn test_expand_env() {
        // SAFETY: test-local variable, no concurrent env readers rely on it.
        unsafe { std::env::set_var("CRESTMAP_TEST_ROOT", "/data") };
        assert_eq!(expand_env("${CRESTMAP_TEST_ROOT}/repos"), "/data/repos");
        assert_eq!(expand_env("${__MISSING__}/x"), "${__MISSING__}/x");
        assert_eq!(expand_env("plain"), "plain");
    }
}
