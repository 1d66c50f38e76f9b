//! Corpus walking and term-scanning engine for crestmap.
//!
//! This crate discovers candidate files under the configured roots and
//! scans them for anchor terms with bounded parallelism.
//!
//! # Overview
//!
//! - **FileWalker** enumerates candidate files via jwalk, pruning excluded
//!   directories before descent and deduplicating overlapping roots.
//! - **ScanEngine** reads each file once, classifies its content bucket,
//!   matches every anchor term, and emits [`HitRecord`]s.
//! - **Progress updates** flow over a broadcast channel at a coarse
//!   interval; cancellation is cooperative via a `CancellationToken`.
//!
//! # Example
//!
//! ```rust,no_run
//! use crestmap_scan::{FileWalker, ScanEngine};
//! use crestmap_core::ScanConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ScanConfig::builder()
//!     .include_roots(vec![std::path::PathBuf::from("/repos")])
//!     .extensions(vec![".md".to_string()])
//!     .anchor_terms(vec!["TODO".to_string()])
//!     .build()
//!     .unwrap();
//!
//! let walk = FileWalker::new(&config).discover();
//! let engine = ScanEngine::new();
//! let outcome = engine.scan(&config, walk.files, &CancellationToken::new()).unwrap();
//! println!("{} hits", outcome.records.len());
//! ```

mod classify;
mod engine;
mod filter;
mod ledger;
mod matcher;
mod progress;
mod repo;
mod walker;

pub use classify::BucketClassifier;
pub use engine::{ScanEngine, ScanOutcome};
pub use filter::{IgnoreRules, PathFilter};
pub use ledger::PathLedger;
pub use matcher::{MAX_CONTEXT_CHARS, TermMatch, TermMatcher, TermPattern, context_line};
pub use progress::ScanProgress;
pub use repo::repo_for_path;
pub use walker::{FileWalker, WalkOutcome};

// Re-export core types for convenience
pub use crestmap_core::{Bucket, HitRecord, ScanConfig, ScanError, ScanWarning, WarningKind};
