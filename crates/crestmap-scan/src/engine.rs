//! Concurrent per-file scanning.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crestmap_core::{HitRecord, ScanConfig, ScanError, ScanWarning};

use crate::classify::BucketClassifier;
use crate::matcher::{MAX_CONTEXT_CHARS, TermMatcher, context_line};
use crate::progress::ScanProgress;
use crate::repo::repo_for_path;
use crate::walker::normalized_extension;

/// Files between two progress notifications.
const PROGRESS_INTERVAL: u64 = 250;

/// Result of a scan run.
///
/// A cancelled run is a documented partial result, not a failure: it holds
/// whatever records were collected before the stop.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Hit records from all scanned files. Records for different files are
    /// unordered; records within a file follow term declaration order.
    pub records: Vec<HitRecord>,
    /// Files that were skipped with a problem.
    pub warnings: Vec<ScanWarning>,
    /// Files actually processed (including skipped ones).
    pub files_scanned: u64,
    /// Whether the run stopped early on the cancellation token.
    pub cancelled: bool,
}

/// Scans files for anchor terms with bounded parallelism.
///
/// Each file is processed independently and exactly once: read as lossy
/// UTF-8, bucket-classified once, then matched against every term pattern.
/// Workers keep their results local and rayon's reduction merges them, so
/// the only shared mutable state is the progress counters.
pub struct ScanEngine {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl ScanEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to progress updates. Subscribing is optional and has no
    /// effect on scan behavior or results.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan the given files against the config's anchor terms.
    ///
    /// Worker count follows `config.threads` (0 = rayon's default). Once
    /// `cancel` fires no new file is dispatched; in-flight files finish and
    /// their records are kept.
    pub fn scan(
        &self,
        config: &ScanConfig,
        files: Vec<PathBuf>,
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome, ScanError> {
        let matcher = TermMatcher::new(&config.anchor_terms);
        let classifier = BucketClassifier::new(
            config.planned_hint_pattern.as_deref(),
            config.code_hint_pattern.as_deref(),
        )?;

        let total = files.len() as u64;
        let processed = AtomicU64::new(0);
        let hits = AtomicU64::new(0);

        let run = || {
            files
                .par_iter()
                .map(|path| {
                    if cancel.is_cancelled() {
                        return FileScan::NotDispatched;
                    }
                    let result = scan_file(path, config, &matcher, &classifier);
                    if let FileScan::Hits(records) = &result {
                        hits.fetch_add(records.len() as u64, Ordering::Relaxed);
                    }
                    let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % PROGRESS_INTERVAL == 0 {
                        let _ = self.progress_tx.send(ScanProgress {
                            files_processed: done,
                            total_files: total,
                            hits_found: hits.load(Ordering::Relaxed),
                        });
                    }
                    result
                })
                .collect::<Vec<_>>()
        };

        let results = match config.threads {
            0 => run(),
            n => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|err| ScanError::Other {
                    message: format!("could not build scan pool: {err}"),
                })?
                .install(run),
        };

        let mut records = Vec::new();
        let mut warnings = Vec::new();
        let mut cancelled = false;
        for result in results {
            match result {
                FileScan::Hits(mut file_records) => records.append(&mut file_records),
                FileScan::Skipped(warning) => warnings.push(warning),
                FileScan::Clean => {}
                FileScan::NotDispatched => cancelled = true,
            }
        }

        let files_scanned = processed.load(Ordering::Relaxed);
        // Final notification: processed == total on a completed run, the
        // partial count on a cancelled one.
        let _ = self.progress_tx.send(ScanProgress {
            files_processed: files_scanned,
            total_files: total,
            hits_found: hits.load(Ordering::Relaxed),
        });
        debug!(files_scanned, hits = records.len(), cancelled, "scan finished");

        Ok(ScanOutcome {
            records,
            warnings,
            files_scanned,
            cancelled,
        })
    }
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-file scan result, kept worker-local until the final merge.
enum FileScan {
    Hits(Vec<HitRecord>),
    Skipped(ScanWarning),
    Clean,
    NotDispatched,
}

fn scan_file(
    path: &Path,
    config: &ScanConfig,
    matcher: &TermMatcher,
    classifier: &BucketClassifier,
) -> FileScan {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => return FileScan::Skipped(ScanWarning::read_error(path, &err)),
    };
    let text = String::from_utf8_lossy(&bytes);

    let bucket = classifier.classify(&text);
    let repo = repo_for_path(path, &config.include_roots);
    let extension = normalized_extension(path).unwrap_or_default();

    let mut records = Vec::new();
    for pattern in matcher.patterns() {
        let Some(found) = pattern.find(&text) else {
            continue;
        };
        records.push(HitRecord {
            term: pattern.term().clone(),
            repo: repo.clone(),
            file_path: path.to_path_buf(),
            extension: extension.clone(),
            bucket,
            frequency: found.count,
            context: context_line(&text, found.first_offset, MAX_CONTEXT_CHARS),
        });
    }

    if records.is_empty() {
        FileScan::Clean
    } else {
        FileScan::Hits(records)
    }
}
