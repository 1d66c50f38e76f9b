//! Path exclusion rules.

use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crestmap_core::ScanConfig;

/// Name of the per-root ignore file picked up automatically.
pub const IGNORE_FILE_NAME: &str = ".crestmapignore";

/// Glob-style ignore rules with gitignore-like negation.
///
/// One rule per line: `**` matches any run of path segments, `*` any run of
/// non-separator characters, `?` a single non-separator character; every
/// other metacharacter is literal. `#` lines and blank lines are skipped,
/// `!` negates. Later rules override earlier ones for the same path: a path
/// is excluded iff the last matching rule is non-negated.
#[derive(Debug)]
pub struct IgnoreRules {
    set: GlobSet,
    negated: Vec<bool>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            set: GlobSet::empty(),
            negated: Vec::new(),
        }
    }
}

impl IgnoreRules {
    /// Parse rules from lines. Malformed globs are dropped (they match
    /// nothing) and the remaining rules still apply.
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut negated = Vec::new();
        for raw in lines {
            let line = raw.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (pattern, neg) = match line.strip_prefix('!') {
                Some(rest) => (rest.trim(), true),
                None => (line, false),
            };
            let escaped = escape_non_glob_meta(pattern);
            match GlobBuilder::new(&escaped)
                .literal_separator(true)
                .backslash_escape(true)
                .build()
            {
                Ok(glob) => {
                    builder.add(glob);
                    negated.push(neg);
                }
                Err(err) => {
                    warn!(pattern, %err, "dropping malformed ignore rule");
                }
            }
        }
        match builder.build() {
            Ok(set) => Self { set, negated },
            Err(err) => {
                warn!(%err, "ignore rules unusable, ignoring all of them");
                Self::default()
            }
        }
    }

    /// Gather rules from the config: inline patterns, listed rule files,
    /// and a `.crestmapignore` in each existing include root.
    pub fn from_config(config: &ScanConfig) -> Self {
        let mut lines: Vec<String> = config.ignore_patterns.clone();
        for file in &config.ignore_files {
            match std::fs::read_to_string(file) {
                Ok(text) => lines.extend(text.lines().map(str::to_string)),
                Err(err) => warn!(path = %file.display(), %err, "could not read ignore file"),
            }
        }
        for root in &config.include_roots {
            let local = root.join(IGNORE_FILE_NAME);
            if let Ok(text) = std::fs::read_to_string(&local) {
                debug!(path = %local.display(), "loaded root ignore file");
                lines.extend(text.lines().map(str::to_string));
            }
        }
        Self::parse(lines)
    }

    /// Whether any rules are present.
    pub fn is_empty(&self) -> bool {
        self.negated.is_empty()
    }

    /// Whether the last matching rule excludes this path.
    pub fn excludes(&self, path: &Path) -> bool {
        if self.negated.is_empty() {
            return false;
        }
        let candidate = path.to_string_lossy().replace('\\', "/");
        self.set
            .matches(candidate.as_str())
            .into_iter()
            .max()
            .map(|idx| !self.negated[idx])
            .unwrap_or(false)
    }
}

/// Escape globset metacharacters outside the `**`/`*`/`?` subset so they
/// match literally.
fn escape_non_glob_meta(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '[' | ']' | '{' | '}' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Combined path exclusion: regex dir/file excludes, ignore rules and a
/// lazy size cap.
///
/// Invalid user-supplied regexes never abort the run; they degrade to a
/// rule that matches nothing.
#[derive(Debug)]
pub struct PathFilter {
    exclude_dir: Option<Regex>,
    exclude_file: Option<Regex>,
    ignore: IgnoreRules,
    max_file_size: Option<u64>,
}

impl PathFilter {
    /// Build the filter from a config, loading any ignore-rule files.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            exclude_dir: compile_or_none(config.exclude_dir_pattern.as_deref()),
            exclude_file: compile_or_none(config.exclude_file_pattern.as_deref()),
            ignore: IgnoreRules::from_config(config),
            max_file_size: config.max_file_size,
        }
    }

    /// Whether a directory path matches the directory-exclusion rule.
    pub fn is_dir_excluded(&self, path: &Path) -> bool {
        matches_lossy(&self.exclude_dir, path)
    }

    /// Whether a file path is excluded by the dir/file regexes or the
    /// ignore rules. The dir regex applies to full file paths too, since
    /// it is matched against whole paths.
    pub fn is_file_excluded(&self, path: &Path) -> bool {
        matches_lossy(&self.exclude_dir, path)
            || matches_lossy(&self.exclude_file, path)
            || self.ignore.excludes(path)
    }

    /// Whether a file of the given length exceeds the configured cap.
    pub fn exceeds_size_cap(&self, len: u64) -> bool {
        self.max_file_size.is_some_and(|cap| len > cap)
    }
}

fn matches_lossy(regex: &Option<Regex>, path: &Path) -> bool {
    regex
        .as_ref()
        .is_some_and(|re| re.is_match(&path.to_string_lossy()))
}

fn compile_or_none(pattern: Option<&str>) -> Option<Regex> {
    let pattern = pattern?.trim();
    if pattern.is_empty() {
        return None;
    }
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(err) => {
            warn!(pattern, %err, "invalid exclude pattern matches nothing");
            None
        }
    }
}
