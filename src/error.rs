//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing the persisted dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Filesystem failure
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Row file could not be parsed or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Usage ledger could not be parsed or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Row file is structurally wrong
    #[error("Malformed row file: {0}")]
    Format(String),

    /// Row index outside the dataset
    #[error("Row index {index} out of range (dataset has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Column already present
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    /// Supplied values do not line up with the dataset
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while loading schema documents
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("YAML error in {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Unsupported schema file format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Duplicate field key '{0}'")]
    DuplicateKey(String),
}

/// Errors from a [`PatternSampler`](crate::domain::PatternSampler)
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Could not produce a matching sample for '{0}'")]
    Unsatisfiable(String),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

pub type SchemaResult<T> = Result<T, SchemaError>;
