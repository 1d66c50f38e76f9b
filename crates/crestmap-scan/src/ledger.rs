//! Visited-path tracking for overlapping include roots.

use std::path::{Path, PathBuf};

use dashmap::DashSet;

/// Tracks paths already claimed by the walk so duplicate or overlapping
/// include roots never yield the same file twice.
///
/// The walker consults this from jwalk's parallel read-dir callback, so the
/// set must support concurrent inserts.
#[derive(Debug, Default)]
pub struct PathLedger {
    seen: DashSet<PathBuf>,
}

impl PathLedger {
    /// Create a new ledger.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Claim a path. Returns `true` the first time a path is seen.
    pub fn first_visit(&self, path: &Path) -> bool {
        self.seen.insert(path.to_path_buf())
    }

    /// Check whether a path was claimed (without claiming it).
    pub fn has_seen(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    /// Number of claimed paths.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no path has been claimed yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
