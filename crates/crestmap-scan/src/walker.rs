//! jwalk-based candidate file discovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use compact_str::CompactString;
use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use crestmap_core::{ScanConfig, ScanWarning, reports};

use crate::filter::PathFilter;
use crate::ledger::PathLedger;

/// Enumerates candidate files under the configured include roots.
///
/// Excluded directories are pruned in jwalk's read-dir callback and never
/// descended into. Nonexistent roots are skipped without error, and
/// per-entry walk failures become warnings rather than aborting the walk.
pub struct FileWalker {
    config: ScanConfig,
    filter: Arc<PathFilter>,
    ledger: Arc<PathLedger>,
}

/// Result of a discovery pass.
#[derive(Debug)]
pub struct WalkOutcome {
    /// Candidate files, each yielded exactly once.
    pub files: Vec<PathBuf>,
    /// Per-entry problems encountered along the way.
    pub warnings: Vec<ScanWarning>,
}

impl FileWalker {
    /// Create a walker for a config, compiling its path filters.
    pub fn new(config: &ScanConfig) -> Self {
        let config = config.clone().normalized();
        let filter = Arc::new(PathFilter::from_config(&config));
        Self {
            config,
            filter,
            ledger: Arc::new(PathLedger::new()),
        }
    }

    /// Discover all candidate files under the include roots.
    ///
    /// The walker remembers claimed paths for its lifetime; build a new
    /// walker for a fresh discovery pass.
    pub fn discover(&self) -> WalkOutcome {
        let mut files = Vec::new();
        let mut warnings = Vec::new();

        // Both the configured form and the canonical form, so the check
        // holds whichever way the walked paths were spelled.
        let mut output_dirs = Vec::new();
        if let Some(dir) = &self.config.output_dir {
            output_dirs.push(dir.clone());
            if let Ok(canonical) = dir.canonicalize() {
                if canonical != *dir {
                    output_dirs.push(canonical);
                }
            }
        }

        for root in &self.config.include_roots {
            if !root.is_dir() {
                debug!(root = %root.display(), "skipping missing include root");
                continue;
            }
            if self.filter.is_dir_excluded(root) {
                continue;
            }
            self.walk_root(root, &output_dirs, &mut files, &mut warnings);
        }

        WalkOutcome { files, warnings }
    }

    fn walk_root(
        &self,
        root: &Path,
        output_dirs: &[PathBuf],
        files: &mut Vec<PathBuf>,
        warnings: &mut Vec<ScanWarning>,
    ) {
        let filter = Arc::clone(&self.filter);
        let ledger = Arc::clone(&self.ledger);
        let walker = WalkDir::new(root)
            .skip_hidden(false)
            .follow_links(false)
            .parallelism(Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            })
            .process_read_dir(move |_depth, _dir, _state, children| {
                // Prune excluded directories before descent; a directory
                // claimed by an earlier overlapping root is pruned too.
                children.retain(|child| match child {
                    Ok(entry) if entry.file_type().is_dir() => {
                        let path = entry.path();
                        !filter.is_dir_excluded(&path) && ledger.first_visit(&path)
                    }
                    _ => true,
                });
            });

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warnings.push(ScanWarning::walk_error(path, err.to_string()));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if is_generated_report(&path) {
                continue;
            }
            if output_dirs.iter().any(|out| path.starts_with(out)) {
                continue;
            }
            let Some(ext) = normalized_extension(&path) else {
                continue;
            };
            if !self.config.extensions.iter().any(|e| e == ext.as_str()) {
                continue;
            }
            if self.filter.is_file_excluded(&path) {
                continue;
            }

            // Stat lazily: only files that already passed every other filter.
            if self.config.max_file_size.is_some() {
                match entry.metadata() {
                    Ok(meta) if self.filter.exceeds_size_cap(meta.len()) => {
                        debug!(path = %path.display(), len = meta.len(), "over size cap");
                        continue;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warnings.push(ScanWarning::walk_error(&path, err.to_string()));
                        continue;
                    }
                }
            }

            if !self.ledger.first_visit(&path) {
                continue;
            }
            files.push(path);
        }
    }
}

/// Lowercased extension with leading dot, or `None` when the path has no
/// extension.
pub(crate) fn normalized_extension(path: &Path) -> Option<CompactString> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    Some(CompactString::new(format!(".{ext}")))
}

fn is_generated_report(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            [
                reports::TABLE_FILE,
                reports::RAW_CSV_FILE,
                reports::SUMMARY_FILE,
            ]
            .iter()
            .any(|generated| name.eq_ignore_ascii_case(generated))
        })
}
