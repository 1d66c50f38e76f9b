//! Error and warning types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a run before or during setup.
///
/// Only configuration and setup failures surface as errors; per-file and
/// per-rule problems degrade to [`ScanWarning`]s and the scan continues.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Config file could not be read.
    #[error("could not read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed as YAML.
    #[error("could not parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Configuration failed validation.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// A hint pattern did not compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create a configuration validation error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// File content could not be read.
    ReadError,
    /// A directory entry could not be enumerated.
    WalkError,
}

/// Non-fatal problem encountered during a walk or scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a read error warning.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(path, format!("read error: {error}"), WarningKind::ReadError)
    }

    /// Create a walk error warning.
    pub fn walk_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, message, WarningKind::WalkError)
    }
}
