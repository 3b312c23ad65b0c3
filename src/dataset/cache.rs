//! Disk-backed memoization of the encoded table.
//!
//! The artifact is keyed by the source file name only. It is written once and
//! never invalidated: changing the row limit or replacing the raw source after
//! the first load keeps serving the old table. `CachePolicy::SourceAndRowLimit`
//! folds the row limit into the file name for callers that want one artifact
//! per limit.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::error::DatasetError;
use super::table::EncodedTable;

/// File extension of cache artifacts.
pub const CACHE_EXTENSION: &str = "cache";

/// How the artifact file name is derived from a [`CacheKey`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// `<source>.cache`; stale if the row limit changes.
    #[default]
    SourceName,
    /// `<source>.<digest of row limit>.cache`.
    SourceAndRowLimit,
}

/// Identity of a cached table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub source_file: String,
    pub row_limit: usize,
}

impl CacheKey {
    pub fn new(source_file: impl Into<String>, row_limit: usize) -> Self {
        Self {
            source_file: source_file.into(),
            row_limit,
        }
    }

    /// Artifact file name under `policy`.
    pub fn artifact_name(&self, policy: CachePolicy) -> String {
        match policy {
            CachePolicy::SourceName => format!("{}.{CACHE_EXTENSION}", self.source_file),
            CachePolicy::SourceAndRowLimit => {
                let digest = blake3::hash(format!("rows={}", self.row_limit).as_bytes());
                let short = &digest.to_hex()[..12];
                format!("{}.{short}.{CACHE_EXTENSION}", self.source_file)
            }
        }
    }
}

/// Cache artifacts stored as files directly under `root`.
#[derive(Debug, Clone)]
pub struct DatasetCache {
    root: PathBuf,
    policy: CachePolicy,
}

impl DatasetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            policy: CachePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn artifact_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.artifact_name(self.policy))
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.artifact_path(key).is_file()
    }

    /// Return the cached table for `key`, or build, persist and return it.
    ///
    /// `build` is not called when an artifact exists. An unreadable artifact
    /// is reported as [`DatasetError::CorruptCache`] and left in place.
    pub fn load_or_build<F>(&self, key: &CacheKey, build: F) -> Result<EncodedTable, DatasetError>
    where
        F: FnOnce() -> Result<EncodedTable, DatasetError>,
    {
        let path = self.artifact_path(key);
        if path.is_file() {
            tracing::info!("Loading cached table from {}", path.display());
            return read_artifact(&path);
        }
        tracing::info!("No cache artifact at {}; building table", path.display());
        let table = build()?;
        write_artifact(&path, &table)?;
        tracing::info!(rows = table.rows(), "Cached table at {}", path.display());
        Ok(table)
    }
}

fn read_artifact(path: &Path) -> Result<EncodedTable, DatasetError> {
    let corrupt = |reason: String| DatasetError::CorruptCache {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table: EncodedTable =
        bincode::deserialize_from(BufReader::new(file)).map_err(|err| corrupt(err.to_string()))?;
    table.validate().map_err(corrupt)?;
    Ok(table)
}

// Written beside the target and renamed so an interrupted run leaves no partial artifact.
fn write_artifact(path: &Path, table: &EncodedTable) -> Result<(), DatasetError> {
    let write_err = |source| DatasetError::CacheWrite {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(write_err)?;
    let tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    let mut writer = BufWriter::new(tmp);
    bincode::serialize_into(&mut writer, table).map_err(|source| DatasetError::CacheEncode {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(write_err)?;
    let tmp = writer
        .into_inner()
        .map_err(|err| write_err(err.into_error()))?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}
