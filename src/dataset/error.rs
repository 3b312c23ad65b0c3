use std::path::PathBuf;

use thiserror::Error;

use super::encoder::EncodeError;
use super::split::SplitError;

/// Errors returned while loading, caching or splitting the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The raw source is absent and no cache artifact can stand in for it.
    #[error("raw source {path} not found and no cache artifact at {cache_path}")]
    MissingSource { path: PathBuf, cache_path: PathBuf },
    /// The cache artifact exists but cannot be decoded.
    #[error("cache artifact {path} is unreadable ({reason}); delete it to rebuild")]
    CorruptCache { path: PathBuf, reason: String },
    /// Writing the cache artifact failed.
    #[error("failed to write cache artifact {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Serializing the table for the cache failed.
    #[error("failed to encode cache artifact {path}: {source}")]
    CacheEncode {
        path: PathBuf,
        source: bincode::Error,
    },
    /// A source line did not match the fixed 14-column schema.
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("categorical encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("invalid train/test split: {0}")]
    Split(#[from] SplitError),
}
