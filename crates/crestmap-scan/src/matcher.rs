//! Anchor-term matching and context extraction.

use compact_str::CompactString;
use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Maximum length of a context snippet, in characters.
pub const MAX_CONTEXT_CHARS: usize = 240;

/// Match result for one term in one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermMatch {
    /// Number of non-overlapping occurrences; always >= 1.
    pub count: u64,
    /// Byte offset of the first occurrence.
    pub first_offset: usize,
}

/// One anchor term with its compiled pattern.
///
/// Terms are escaped before compilation, so user-supplied regex
/// metacharacters match literally. The compiled `Regex` is immutable and
/// safe to share across scan workers by reference.
#[derive(Debug)]
pub struct TermPattern {
    term: CompactString,
    regex: Regex,
}

impl TermPattern {
    /// The term in its configured, case-preserving form.
    pub fn term(&self) -> &CompactString {
        &self.term
    }

    /// Count non-overlapping case-insensitive occurrences of the term.
    pub fn find(&self, text: &str) -> Option<TermMatch> {
        let mut iter = self.regex.find_iter(text);
        let first = iter.next()?;
        Some(TermMatch {
            count: 1 + iter.count() as u64,
            first_offset: first.start(),
        })
    }
}

/// Holds one compiled pattern per anchor term for the whole run.
#[derive(Debug, Default)]
pub struct TermMatcher {
    patterns: Vec<TermPattern>,
}

impl TermMatcher {
    /// Compile one escaped, case-insensitive pattern per term, preserving
    /// declaration order.
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Self {
        let mut patterns = Vec::with_capacity(terms.len());
        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() {
                continue;
            }
            match RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => patterns.push(TermPattern {
                    term: CompactString::new(term),
                    regex,
                }),
                Err(err) => warn!(term, %err, "skipping term that failed to compile"),
            }
        }
        Self { patterns }
    }

    /// Compiled patterns in declaration order.
    pub fn patterns(&self) -> &[TermPattern] {
        &self.patterns
    }

    /// Number of compiled terms.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no terms are compiled.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Extract the line enclosing `offset`, whitespace-collapsed, trimmed and
/// truncated to `max_chars`. Returns an empty string when `offset` is out
/// of range. Never spans multiple lines.
pub fn context_line(text: &str, offset: usize, max_chars: usize) -> String {
    if offset >= text.len() {
        return String::new();
    }
    let start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(text.len());

    let mut collapsed = String::with_capacity(end - start);
    for word in text[start..end].split_whitespace() {
        if !collapsed.is_empty() {
            collapsed.push(' ');
        }
        collapsed.push_str(word);
    }
    if collapsed.chars().count() > max_chars {
        collapsed.chars().take(max_chars).collect()
    } else {
        collapsed
    }
}
